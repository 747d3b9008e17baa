use std::collections::HashSet;

use super::*;
use crate::testing::{fake_client, param, FakeCatalog};

fn limits(page_size: usize, max_page_items: usize) -> CrawlLimits {
    CrawlLimits {
        page_size,
        max_page_items,
        max_drift_restarts: 2,
        perturbation: Perturbation::NONE,
    }
}

fn query(sort: SortStrategy) -> QuerySpec {
    QuerySpec::new(CrawlTarget::new(479, 30), sort, None)
}

async fn drain<T: Transport>(
    paginator: &mut Paginator,
    client: &SearchClient<T>,
) -> Result<Vec<PageResult>, ScraperError> {
    let mut pages = Vec::new();
    while let Some(page) = paginator.next_page(client).await? {
        pages.push(page);
    }
    Ok(pages)
}

#[test]
fn page_params_omit_relevance_sort() {
    let q = query(SortStrategy::Relevance);
    let params = q.page_params(QueryParams::new(), 60, 120);
    assert_eq!(params.get("limit").map(String::as_str), Some("60"));
    assert_eq!(params.get("offset").map(String::as_str), Some("120"));
    assert!(!params.contains_key("sort"));
}

#[test]
fn page_params_carry_sort_and_filter() {
    let q = QuerySpec::new(
        CrawlTarget::new(1, 2),
        SortStrategy::PriceDescending,
        Some(("brandName".to_owned(), "Acme".to_owned())),
    );
    let params = q.page_params(QueryParams::new(), 10, 0);
    assert_eq!(params.get("sort").map(String::as_str), Some("price_desc"));
    assert_eq!(params.get("brandName").map(String::as_str), Some("Acme"));
    assert_eq!(q.to_string(), "001-002 sort=price_desc brandName=Acme");
}

#[tokio::test]
async fn walks_every_page_of_a_small_result_set() {
    let client = fake_client(FakeCatalog::numbered(35));
    let mut paginator = Paginator::new(query(SortStrategy::Relevance), &limits(10, 1_000));

    let pages = drain(&mut paginator, &client).await.unwrap();

    assert_eq!(client.transport().offsets(), [0, 10, 20, 30]);
    assert_eq!(pages.len(), 4);
    assert!(paginator.is_done());

    let mut union = HashSet::new();
    for page in &pages {
        assert_eq!(page.skus.len(), page.response.data.len(), "no duplicates within a page");
        union.extend(page.skus.iter().cloned());
    }
    assert_eq!(union.len(), 35);
    assert!(union.len() <= pages[0].total_count);
}

#[tokio::test]
async fn empty_result_set_yields_one_empty_page() {
    let client = fake_client(FakeCatalog::numbered(0));
    let mut paginator = Paginator::new(query(SortStrategy::Relevance), &limits(10, 1_000));

    let pages = drain(&mut paginator, &client).await.unwrap();

    assert_eq!(pages.len(), 1);
    assert!(pages[0].skus.is_empty());
    assert_eq!(client.transport().requests().len(), 1);
}

#[tokio::test]
async fn stops_one_page_past_the_offset_ceiling() {
    let client = fake_client(FakeCatalog::numbered(100));
    let mut paginator = Paginator::new(query(SortStrategy::NameAscending), &limits(10, 30));

    let pages = drain(&mut paginator, &client).await.unwrap();

    // 40 is clamped to the ceiling, 50 is past ceiling + page size
    assert_eq!(client.transport().offsets(), [0, 10, 20, 30, 30]);
    assert_eq!(pages.len(), 5);
    assert_eq!(pages[4].offset, 30);
    for params in client.transport().request_params() {
        assert_eq!(param(&params, "sort"), Some("name_asc"));
    }
}

#[tokio::test]
async fn drift_restarts_from_offset_zero() {
    // third response reports 40 instead of 35
    let catalog = FakeCatalog::numbered(35).with_scripted_totals([35, 35, 40]);
    let client = fake_client(catalog);
    let mut paginator = Paginator::new(query(SortStrategy::Relevance), &limits(10, 1_000));

    let pages = drain(&mut paginator, &client).await.unwrap();

    assert_eq!(client.transport().offsets(), [0, 10, 20, 0, 10, 20, 30]);
    let yielded: Vec<usize> = pages.iter().map(|p| p.offset).collect();
    assert_eq!(yielded, [0, 10, 0, 10, 20, 30], "the drifted page is not yielded");
    assert_eq!(paginator.drift_restarts(), 1);
}

#[tokio::test]
async fn repeated_drift_gives_up() {
    let catalog = FakeCatalog::numbered(20).with_scripted_totals([10, 11, 10, 11, 10, 11]);
    let client = fake_client(catalog);
    let mut paginator = Paginator::new(query(SortStrategy::Relevance), &limits(5, 1_000));

    let mut yielded = 0;
    let err = loop {
        match paginator.next_page(&client).await {
            Ok(Some(_)) => yielded += 1,
            Ok(None) => panic!("expected a drift error"),
            Err(err) => break err,
        }
    };

    assert_eq!(yielded, 3);
    assert!(
        matches!(err, ScraperError::DriftLimit { restarts: 3, .. }),
        "got {err:?}"
    );
    assert_eq!(client.transport().requests().len(), 6);
}
