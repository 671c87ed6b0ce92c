mod common;

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

use common::*;
use dex_catalog::api::{Fetch, ResourceKind, FULL_INDEX_LIMIT};
use dex_catalog::error::{CatalogError, FetchError};
use dex_catalog::models::{IndexEntry, Move, Pokemon};
use dex_catalog::session::{
    GroupedListing, GroupedSession, ListingSession, SessionStatus, Source,
};

fn source(fake: Arc<FakeFetch>) -> Source {
    let fetch: Arc<dyn Fetch> = fake;
    Source::new(fetch, BASE)
}

async fn wait_until(mut ready: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if ready() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn listing_loads_sorted_and_reports_progress() {
    let moves = [(33, "tackle"), (1, "pound"), (10, "scratch"), (2, "karate-chop")];
    let fake = Arc::new(move_api(&moves).failing(url(ResourceKind::Move, 10)));
    let mut session: ListingSession<Move> = ListingSession::new(source(fake.clone()));

    session.load().await.unwrap();

    let ids: Vec<u32> = session.view(|items| items.iter().map(|m| m.id).collect());
    assert_eq!(ids, vec![1, 2, 33]);
    assert_eq!(session.status(), SessionStatus::Ready);
    let progress = session.progress();
    assert!(!progress.in_progress);
    assert_eq!((progress.fetched, progress.total), (3, 4));
    assert_eq!(fake.call_count(&ResourceKind::Move.index_url(BASE, FULL_INDEX_LIMIT)), 1);
}

#[tokio::test]
async fn index_failure_fails_the_session_without_partial_results() {
    let fake = Arc::new(FakeFetch::new().failing(ResourceKind::Move.index_url(BASE, FULL_INDEX_LIMIT)));
    let mut session: ListingSession<Move> = ListingSession::new(source(fake));

    let err = session.load().await.unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Index {
            kind: ResourceKind::Move,
            source: FetchError::HttpStatus(500)
        }
    ));
    assert!(matches!(session.status(), SessionStatus::Failed(_)));
    assert!(session.is_empty());
}

#[tokio::test]
async fn index_is_fetched_once_per_lifecycle() {
    let fake = Arc::new(move_api(&[(1, "pound")]));
    let index_url = ResourceKind::Move.index_url(BASE, FULL_INDEX_LIMIT);
    let mut session: ListingSession<Move> = ListingSession::new(source(fake.clone()));

    session.load().await.unwrap();
    session.load().await.unwrap();
    session.start();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(fake.call_count(&index_url), 1);

    session.restart();
    wait_until(|| session.status() == SessionStatus::Ready).await;
    assert_eq!(fake.call_count(&index_url), 2);
    assert_eq!(session.len(), 1);
}

#[tokio::test]
async fn background_session_publishes_items_as_they_arrive() {
    let moves = [(1, "pound"), (2, "karate-chop"), (3, "double-slap")];
    let mut fake = move_api(&moves);
    let gate = fake.gate(url(ResourceKind::Move, 3));
    let fake = Arc::new(fake);
    let mut session: ListingSession<Move> = ListingSession::new(source(fake.clone()));

    session.start();
    fake.wait_for_call(&url(ResourceKind::Move, 3)).await;
    wait_until(|| session.len() == 2).await;
    assert_eq!(session.status(), SessionStatus::Loading);
    assert!(session.progress().in_progress);

    gate.notify_one();
    wait_until(|| session.status() == SessionStatus::Ready).await;
    assert_eq!(session.len(), 3);
}

#[tokio::test]
async fn cancelled_session_keeps_what_it_has() {
    let moves = [(1, "pound"), (2, "karate-chop"), (3, "double-slap")];
    let mut fake = move_api(&moves);
    let gate = fake.gate(url(ResourceKind::Move, 2));
    let fake = Arc::new(fake);
    let mut session: ListingSession<Move> = ListingSession::new(source(fake.clone()));

    session.start();
    fake.wait_for_call(&url(ResourceKind::Move, 2)).await;
    session.cancel();
    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(session.len(), 1);
    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(fake.call_count(&url(ResourceKind::Move, 3)), 0);
}

#[tokio::test]
async fn cancelled_session_does_not_load_again_until_restarted() {
    let moves = [(1, "pound"), (2, "karate-chop"), (3, "double-slap")];
    let mut fake = move_api(&moves);
    let gate = fake.gate(url(ResourceKind::Move, 2));
    let fake = Arc::new(fake);
    let index_url = ResourceKind::Move.index_url(BASE, FULL_INDEX_LIMIT);
    let mut session: ListingSession<Move> = ListingSession::new(source(fake.clone()));

    session.start();
    fake.wait_for_call(&url(ResourceKind::Move, 2)).await;
    session.cancel();
    gate.notify_one();

    session.load().await.unwrap();
    session.start();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(fake.call_count(&index_url), 1);
    assert_eq!(fake.call_count(&url(ResourceKind::Move, 1)), 1);
    assert_eq!(session.len(), 1);
    assert_eq!(session.progress().fetched, 1);
}

#[tokio::test]
async fn duplicate_records_do_not_inflate_progress() {
    let fake = move_api(&[(1, "pound")]).with(format!("{BASE}/move/1"), move_body(1, "pound"));
    let index = vec![
        entry(ResourceKind::Move, 1, "pound"),
        IndexEntry::new("pound", format!("{BASE}/move/1")),
    ];
    let fake = Arc::new(fake.with_index(ResourceKind::Move, &index));
    let mut session: ListingSession<Move> = ListingSession::new(source(fake.clone()));

    session.load().await.unwrap();
    assert_eq!(session.len(), 1);
    let progress = session.progress();
    assert_eq!((progress.fetched, progress.total), (1, 2));
}

#[tokio::test]
async fn only_the_pokemon_listing_is_capped() {
    let fake = move_api(&[(1, "pound")]).with(ResourceKind::Pokemon.index_url(BASE, 151), index_body(&[]));
    let fake = Arc::new(fake);
    let capped = source(fake.clone()).with_pokemon_limit(Some(151));

    let mut moves: ListingSession<Move> = ListingSession::new(capped.clone());
    moves.load().await.unwrap();
    assert_eq!(fake.call_count(&ResourceKind::Move.index_url(BASE, FULL_INDEX_LIMIT)), 1);

    let mut pokemon: ListingSession<Pokemon> = ListingSession::new(capped);
    pokemon.load().await.unwrap();
    assert_eq!(fake.call_count(&ResourceKind::Pokemon.index_url(BASE, 151)), 1);
    assert_eq!(fake.calls().len(), 3);
}

fn forms_api() -> FakeFetch {
    let species = [
        entry(ResourceKind::PokemonSpecies, 1, "bulbasaur"),
        entry(ResourceKind::PokemonSpecies, 2, "ivysaur"),
        entry(ResourceKind::PokemonSpecies, 3, "venusaur"),
    ];
    FakeFetch::new()
        .with_index(ResourceKind::PokemonSpecies, &species)
        .with(url(ResourceKind::PokemonSpecies, 1), species_body(1, "bulbasaur", &[(1, "bulbasaur")]))
        .with(url(ResourceKind::PokemonSpecies, 2), species_body(2, "ivysaur", &[(2, "ivysaur")]))
        .with(
            url(ResourceKind::PokemonSpecies, 3),
            species_body(3, "venusaur", &[(3, "venusaur"), (10033, "venusaur-mega")]),
        )
        .with(url(ResourceKind::Pokemon, 1), pokemon_body(1, "bulbasaur"))
        .with(url(ResourceKind::Pokemon, 2), pokemon_body(2, "ivysaur"))
        .with(url(ResourceKind::Pokemon, 3), pokemon_body(3, "venusaur"))
        .with(url(ResourceKind::Pokemon, 10033), pokemon_body(10033, "venusaur-mega"))
}

#[tokio::test]
async fn grouped_session_pages_until_exhausted() {
    let fake = Arc::new(forms_api());
    let mut session = GroupedSession::new(source(fake.clone()), 1);

    assert!(!session.is_exhausted());
    let mut pages = 0;
    while !session.is_exhausted() {
        session.load_more().await.unwrap();
        pages += 1;
    }

    assert_eq!(pages, 3);
    let groups: Vec<(&str, Vec<u32>)> = session
        .groups()
        .iter()
        .map(|g| (g.group_name.as_str(), g.members.iter().map(|m: &Pokemon| m.id).collect()))
        .collect();
    assert_eq!(
        groups,
        vec![("bulbasaur", vec![1]), ("ivysaur", vec![2]), ("venusaur", vec![3, 10033])]
    );
    assert_eq!(session.seen().len(), 4);
    assert_eq!(
        fake.call_count(&ResourceKind::PokemonSpecies.index_url(BASE, FULL_INDEX_LIMIT)),
        1
    );
}

#[tokio::test]
async fn grouped_session_surfaces_index_failure() {
    let index_url = ResourceKind::PokemonSpecies.index_url(BASE, FULL_INDEX_LIMIT);
    let fake = Arc::new(FakeFetch::new().failing(index_url.clone()));
    let mut session = GroupedSession::new(source(fake.clone()), 4);

    assert!(matches!(
        session.load_more().await,
        Err(CatalogError::Index {
            kind: ResourceKind::PokemonSpecies,
            ..
        })
    ));
    assert!(!session.is_exhausted());

    // the failure is final for this session
    assert!(matches!(
        session.load_more().await,
        Err(CatalogError::IndexUnavailable {
            kind: ResourceKind::PokemonSpecies,
            ..
        })
    ));
    assert_eq!(fake.call_count(&index_url), 1);
}

#[tokio::test]
async fn grouped_listing_ignores_requests_while_busy() {
    let mut fake = forms_api();
    let gate = fake.gate(url(ResourceKind::PokemonSpecies, 1));
    let fake = Arc::new(fake);
    let listing = GroupedListing::new(GroupedSession::new(source(fake.clone()), 10));

    assert!(listing.request_more());
    assert!(!listing.request_more());
    assert!(listing.is_loading());

    gate.notify_one();
    wait_until(|| !listing.is_loading()).await;
    let view = listing.snapshot();
    assert!(view.exhausted);
    assert_eq!(view.groups.len(), 3);
    assert_eq!((view.examined, view.total), (3, 3));
    assert!(!listing.request_more());
}

#[tokio::test]
async fn dropping_a_grouped_listing_stops_its_batch() {
    let mut fake = forms_api();
    let gate = fake.gate(url(ResourceKind::PokemonSpecies, 2));
    let fake = Arc::new(fake);
    let listing = GroupedListing::new(GroupedSession::new(source(fake.clone()), 10));

    assert!(listing.request_more());
    fake.wait_for_call(&url(ResourceKind::PokemonSpecies, 2)).await;
    drop(listing);
    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(fake.call_count(&url(ResourceKind::PokemonSpecies, 3)), 0);
    assert_eq!(fake.call_count(&url(ResourceKind::Pokemon, 3)), 0);
}
