mod helpers;

use anyhow::Result;
use conveyor_filters::application::{
    FilterBrowser, ListingRequest, ListingScope, StaticSession,
};
use conveyor_filters::domain::{CategorySelector, Cursor, SortMode, SortValue};
use conveyor_filters::infrastructure::SqliteRepository;
use helpers::{Seed, TestDatabase};
use std::collections::HashSet;

/// Nine public filters with repeated popularity, export and timestamp values.
fn seed_catalogue(repo: &mut SqliteRepository) -> Result<()> {
    let shapes: [(u32, u32, i64); 9] = [
        (3, 0, 0),
        (0, 1, 5),
        (3, 0, 5),
        (1, 2, 10),
        (10, 0, 10),
        (0, 1, 10),
        (5, 0, 15),
        (3, 0, 20),
        (10, 0, 20),
    ];
    for (i, (views, exports, minute)) in shapes.into_iter().enumerate() {
        let name = format!("filter-{}", i + 1);
        Seed::public("alice", &name)
            .views(views)
            .exports(exports)
            .at_minute(minute)
            .insert(repo)?;
    }
    Ok(())
}

fn walk(repo: &mut SqliteRepository, sort: SortMode, page_size: usize) -> Result<Vec<i64>> {
    let mut browser = FilterBrowser::new(repo, StaticSession::anonymous());
    let mut seen = Vec::new();
    let mut cursor = None;

    loop {
        let page = browser.browse(&ListingRequest {
            sort,
            cursor: cursor.take(),
            page_size: Some(page_size),
            ..Default::default()
        })?;
        assert!(page.items.len() <= page_size);
        seen.extend(page.items.iter().map(|f| f.id));

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
        assert!(seen.len() <= 9, "pagination did not terminate");
    }
    Ok(seen)
}

#[test]
fn given_tied_scores_when_paging_by_one_then_lower_id_comes_first() -> Result<()> {
    // Arrange
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    seed_catalogue(&mut repo)?;

    // Act
    let order = walk(&mut repo, SortMode::Popular, 1)?;

    // Assert: ids 5 and 9 both score 10, behind id 4 with 11
    assert_eq!(order, vec![4, 5, 9, 2, 6, 7, 1, 3, 8]);
    Ok(())
}

#[test]
fn given_every_sort_mode_and_page_size_when_paging_then_visits_each_row_once_in_fixed_order(
) -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    seed_catalogue(&mut repo)?;

    for sort in SortMode::ALL {
        let reference = walk(&mut repo, sort, 100)?;
        assert_eq!(reference.len(), 9, "sort {sort}");

        for page_size in 1..=9 {
            let walked = walk(&mut repo, sort, page_size)?;
            assert_eq!(walked, reference, "sort {sort}, page size {page_size}");
            let unique: HashSet<_> = walked.iter().collect();
            assert_eq!(unique.len(), walked.len());
        }
    }
    Ok(())
}

#[test]
fn given_seeded_catalogue_when_sorting_by_exports_then_ties_break_by_id() -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    seed_catalogue(&mut repo)?;

    let order = walk(&mut repo, SortMode::MostUsed, 4)?;

    assert_eq!(order, vec![4, 2, 6, 1, 3, 5, 7, 8, 9]);
    Ok(())
}

#[test]
fn given_seeded_catalogue_when_sorting_by_newest_then_latest_first_ties_by_id() -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    seed_catalogue(&mut repo)?;

    let order = walk(&mut repo, SortMode::New, 2)?;

    assert_eq!(order, vec![8, 9, 7, 4, 5, 6, 2, 3, 1]);
    Ok(())
}

#[test]
fn given_last_page_when_browsing_then_next_cursor_is_absent() -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    seed_catalogue(&mut repo)?;
    let mut browser = FilterBrowser::new(&mut repo, StaticSession::anonymous());

    let exact = browser.browse(&ListingRequest {
        page_size: Some(9),
        ..Default::default()
    })?;

    assert_eq!(exact.items.len(), 9);
    assert!(exact.next_cursor.is_none());
    Ok(())
}

#[test]
fn given_garbage_cursor_when_browsing_then_starts_from_the_top() -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    seed_catalogue(&mut repo)?;
    let mut browser = FilterBrowser::new(&mut repo, StaticSession::anonymous());

    let fresh = browser.browse(&ListingRequest {
        page_size: Some(3),
        ..Default::default()
    })?;
    let garbage = browser.browse(&ListingRequest {
        cursor: Some("!!!not-base64!!!".to_string()),
        page_size: Some(3),
        ..Default::default()
    })?;

    assert_eq!(fresh, garbage);
    Ok(())
}

#[test]
fn given_cursor_from_other_sort_when_browsing_then_starts_from_the_top() -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    seed_catalogue(&mut repo)?;
    let mut browser = FilterBrowser::new(&mut repo, StaticSession::anonymous());
    let foreign = Cursor::new(4, SortValue::Int(2), SortMode::MostUsed).encode();

    let page = browser.browse(&ListingRequest {
        sort: SortMode::Popular,
        cursor: Some(foreign),
        page_size: Some(2),
        ..Default::default()
    })?;

    assert_eq!(page.items.iter().map(|f| f.id).collect::<Vec<_>>(), vec![4, 5]);
    Ok(())
}

#[test]
fn given_private_filters_when_browsing_public_then_they_are_hidden() -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    let shown = Seed::public("alice", "shown").insert(&mut repo)?;
    let hidden = Seed::private("alice", "hidden").views(50).insert(&mut repo)?;

    let public = FilterBrowser::new(&mut repo, StaticSession::anonymous())
        .browse(&ListingRequest::default())?;
    let mine = FilterBrowser::new(&mut repo, StaticSession::signed_in("alice")).browse(
        &ListingRequest {
            scope: ListingScope::Mine(CategorySelector::All),
            ..Default::default()
        },
    )?;

    assert_eq!(public.items.iter().map(|f| f.id).collect::<Vec<_>>(), vec![shown.id]);
    assert_eq!(
        mine.items.iter().map(|f| f.id).collect::<Vec<_>>(),
        vec![hidden.id, shown.id]
    );
    Ok(())
}

#[test]
fn given_search_with_wildcards_when_browsing_then_matches_literally() -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    let literal = Seed::public("alice", "100% iron").insert(&mut repo)?;
    Seed::public("alice", "1000 iron").insert(&mut repo)?;
    let upper = Seed::public("bob", "COPPER line").insert(&mut repo)?;
    let mut browser = FilterBrowser::new(&mut repo, StaticSession::anonymous());

    let percent = browser.browse(&ListingRequest {
        search: Some("100%".to_string()),
        ..Default::default()
    })?;
    let case = browser.browse(&ListingRequest {
        search: Some("  copper  ".to_string()),
        ..Default::default()
    })?;

    assert_eq!(percent.items.iter().map(|f| f.id).collect::<Vec<_>>(), vec![literal.id]);
    assert_eq!(case.items.iter().map(|f| f.id).collect::<Vec<_>>(), vec![upper.id]);
    Ok(())
}

#[test]
fn given_non_ascii_names_when_searching_other_case_then_matches() -> Result<()> {
    // Arrange
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    let apples = Seed::public("alice", "ÄPFEL sorter").insert(&mut repo)?;
    let oil = Seed::public("bob", "öl raffinerie").insert(&mut repo)?;
    Seed::public("bob", "apfel sorter").insert(&mut repo)?;
    let mut browser = FilterBrowser::new(&mut repo, StaticSession::anonymous());

    // Act
    let lower = browser.browse(&ListingRequest {
        search: Some("äpfel".to_string()),
        ..Default::default()
    })?;
    let upper = browser.browse(&ListingRequest {
        search: Some("ÖL RAFF".to_string()),
        ..Default::default()
    })?;

    // Assert
    assert_eq!(lower.items.iter().map(|f| f.id).collect::<Vec<_>>(), vec![apples.id]);
    assert_eq!(upper.items.iter().map(|f| f.id).collect::<Vec<_>>(), vec![oil.id]);
    Ok(())
}
