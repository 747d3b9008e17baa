//! Facet trees and the flat filter list derived from them.
//!
//! The API returns each facet as a recursive tree of values. [`FacetTree`]
//! stores one facet as an arena of nodes with index-based children, and
//! [`FacetTree::flatten`] walks it depth-first, pre-order (every node comes
//! before its descendants), producing one [`FlatFilter`] per node.

use std::collections::BTreeSet;

use crate::types::{Facet, FacetValue};

/// `key=value`, the identity of a [`FlatFilter`].
pub type FilterId = String;

/// A single `key=value` filter the search endpoint accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatFilter {
    /// Facet parameter name, e.g. `brandName`. Empty for the null filter.
    pub key: String,
    pub value: String,
    /// Products matching this filter alone, as reported by the API.
    /// Not derived from the children, which can overlap.
    pub item_count: usize,
    /// Ids of the immediate children in the facet tree.
    pub children: BTreeSet<FilterId>,
}

impl FlatFilter {
    /// The "no filter" entry: every product in the store.
    #[must_use]
    pub fn null(catalog_size: usize) -> Self {
        Self {
            key: String::new(),
            value: String::new(),
            item_count: catalog_size,
            children: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> FilterId {
        filter_id(&self.key, &self.value)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.key.is_empty()
    }

    /// Query parameter for this filter, `None` for the null filter.
    #[must_use]
    pub fn as_param(&self) -> Option<(String, String)> {
        if self.is_null() {
            None
        } else {
            Some((self.key.clone(), self.value.clone()))
        }
    }
}

fn filter_id(key: &str, value: &str) -> FilterId {
    format!("{key}={value}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetNode {
    pub key: String,
    pub doc_count: usize,
    pub is_selected: bool,
    pub children: Vec<usize>,
}

/// One facet's value tree, stored as an arena.
#[derive(Debug, Clone, Default)]
pub struct FacetTree {
    parameter_name: String,
    nodes: Vec<FacetNode>,
    roots: Vec<usize>,
}

impl FacetTree {
    /// Copies a facet's nested values into an arena.
    #[must_use]
    pub fn from_facet(facet: &Facet) -> Self {
        let mut tree = Self {
            parameter_name: facet.config.parameter_name.clone(),
            nodes: Vec::new(),
            roots: Vec::new(),
        };

        let mut stack: Vec<(&FacetValue, Option<usize>)> =
            facet.values.iter().rev().map(|v| (v, None)).collect();

        while let Some((value, parent)) = stack.pop() {
            let index = tree.nodes.len();
            tree.nodes.push(FacetNode {
                key: value.key.clone(),
                doc_count: value.doc_count,
                is_selected: value.is_selected.unwrap_or(false),
                children: Vec::with_capacity(value.children.len()),
            });
            match parent {
                Some(p) => tree.nodes[p].children.push(index),
                None => tree.roots.push(index),
            }
            stack.extend(value.children.iter().rev().map(|c| (c, Some(index))));
        }

        tree
    }

    #[must_use]
    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node(&self, index: usize) -> Option<&FacetNode> {
        self.nodes.get(index)
    }

    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Depth-first, pre-order walk producing one filter per node.
    #[must_use]
    pub fn flatten(&self) -> Vec<FlatFilter> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            out.push(FlatFilter {
                key: self.parameter_name.clone(),
                value: node.key.clone(),
                item_count: node.doc_count,
                children: node
                    .children
                    .iter()
                    .map(|&c| filter_id(&self.parameter_name, &self.nodes[c].key))
                    .collect(),
            });
            stack.extend(node.children.iter().rev());
        }

        out
    }
}

/// Flattens every facet independently and concatenates the results.
#[must_use]
pub fn flatten_facets(facets: &[Facet]) -> Vec<FlatFilter> {
    facets
        .iter()
        .flat_map(|facet| FacetTree::from_facet(facet).flatten())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn facet(value: serde_json::Value) -> Facet {
        serde_json::from_value(value).expect("test facet should parse")
    }

    /// frozen(12) -> [pizza(6) -> [thin(2)], veg(6)], bakery(8)
    fn category_facet() -> Facet {
        facet(json!({
            "name": "categoryTree",
            "config": { "parameterName": "categoryTree" },
            "values": [
                {
                    "key": "frozen", "docCount": 12,
                    "children": [
                        {
                            "key": "pizza", "docCount": 6,
                            "children": [ { "key": "thin", "docCount": 2, "children": [] } ]
                        },
                        { "key": "veg", "docCount": 6, "children": [] }
                    ]
                },
                { "key": "bakery", "docCount": 8, "isSelected": true, "children": [] }
            ]
        }))
    }

    fn brand_facet() -> Facet {
        facet(json!({
            "name": "brandName",
            "config": { "parameterName": "brandName" },
            "values": [
                { "key": "Acme", "docCount": 30 },
                { "key": "Bolt", "docCount": 9 }
            ]
        }))
    }

    #[test]
    fn arena_preserves_shape() {
        let tree = FacetTree::from_facet(&category_facet());
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.roots().len(), 2);

        let frozen = tree.node(tree.roots()[0]).unwrap();
        assert_eq!(frozen.key, "frozen");
        let child_keys: Vec<&str> = frozen
            .children
            .iter()
            .map(|&c| tree.node(c).unwrap().key.as_str())
            .collect();
        assert_eq!(child_keys, ["pizza", "veg"]);

        let bakery = tree.node(tree.roots()[1]).unwrap();
        assert!(bakery.is_selected);
        assert!(!frozen.is_selected);
    }

    #[test]
    fn flatten_is_pre_order() {
        let flat = FacetTree::from_facet(&category_facet()).flatten();
        let order: Vec<&str> = flat.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(order, ["frozen", "pizza", "thin", "veg", "bakery"]);
    }

    #[test]
    fn flatten_keeps_every_node_once() {
        let tree = FacetTree::from_facet(&category_facet());
        let flat = tree.flatten();
        assert_eq!(flat.len(), tree.len());
        let ids: BTreeSet<FilterId> = flat.iter().map(FlatFilter::id).collect();
        assert_eq!(ids.len(), flat.len());
    }

    #[test]
    fn flat_filter_carries_own_count_and_immediate_children() {
        let flat = FacetTree::from_facet(&category_facet()).flatten();
        let frozen = &flat[0];
        assert_eq!(frozen.id(), "categoryTree=frozen");
        assert_eq!(frozen.item_count, 12);
        assert_eq!(
            frozen.children,
            BTreeSet::from([
                "categoryTree=pizza".to_owned(),
                "categoryTree=veg".to_owned()
            ])
        );
        // grandchildren are not listed on the grandparent
        assert!(!frozen.children.contains("categoryTree=thin"));

        let pizza = &flat[1];
        assert_eq!(pizza.children, BTreeSet::from(["categoryTree=thin".to_owned()]));
    }

    #[test]
    fn forest_is_flattened_per_facet_and_concatenated() {
        let flat = flatten_facets(&[brand_facet(), category_facet()]);
        assert_eq!(flat.len(), 7);
        assert_eq!(flat[0].id(), "brandName=Acme");
        assert_eq!(flat[1].id(), "brandName=Bolt");
        assert_eq!(flat[2].id(), "categoryTree=frozen");
    }

    #[test]
    fn deep_trees_flatten_completely() {
        let mut value = json!({ "key": "leaf", "docCount": 1, "children": [] });
        for depth in 0..200 {
            value = json!({ "key": format!("n{depth}"), "docCount": 1, "children": [value] });
        }
        let facet = Facet {
            name: "deep".to_owned(),
            localized_name: None,
            config: crate::types::FacetConfig {
                parameter_name: "deep".to_owned(),
                is_multi_value: false,
            },
            values: vec![serde_json::from_value(value).unwrap()],
        };
        let tree = FacetTree::from_facet(&facet);
        assert_eq!(tree.len(), 201);
        assert_eq!(tree.flatten().len(), 201);
    }

    #[test]
    fn null_filter_has_no_param() {
        let null = FlatFilter::null(120);
        assert!(null.is_null());
        assert_eq!(null.as_param(), None);
        assert_eq!(null.id(), "=");
        assert_eq!(null.item_count, 120);
    }
}
