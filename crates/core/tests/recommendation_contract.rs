use std::collections::HashSet;

use freshcart_core::domain::behavior::{BehaviorEvent, UserId};
use freshcart_core::domain::product::{Product, ProductId};
use freshcart_core::recommend::{
    get_bundles, get_collaborative_recommendations, get_graph_recommendations,
    get_similar_products, normalize_catalog, recommend, BehaviorGraph, CollaborativeStrategy,
    RecommendationContext, SimilarityScorer,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

type ContractResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
}

fn catalog() -> ContractResult<Vec<Product>> {
    serde_json::from_str(
        r#"[
          {"id": 1, "categoryId": "fruit", "price": 10, "rating": 4.5, "sales": 40, "tags": ["sweet", "crisp"], "isOrganic": true, "originPlace": "Valencia"},
          {"id": 2, "categoryId": "fruit", "price": 12, "rating": 4.0, "sales": 90, "tags": ["sweet"], "isOrganic": false},
          {"id": 3, "categoryId": "veg", "price": 3, "sales": 10, "tags": ["crunchy"], "shelfLife": 14},
          {"id": 4, "categoryId": "veg", "price": 2.5, "rating": 3.0, "sales": 70, "tags": ["leafy", "green"], "isLocal": true},
          {"id": 5, "categoryId": "dairy", "price": 4, "rating": 4.8, "sales": 120, "isFresh": true, "shelfLife": 7},
          {"id": 6, "categoryId": "dairy", "price": 0, "sales": 0}
        ]"#,
    )
    .map_err(|error| format!("catalog fixture should parse: {error}"))
}

fn behaviors() -> ContractResult<Vec<BehaviorEvent>> {
    serde_json::from_str(
        r#"[
          {"userId": "u1", "productId": 1, "behaviorType": "purchase"},
          {"userId": "u1", "productId": 3, "behaviorType": "view"},
          {"userId": "u2", "productId": 1, "behaviorType": "purchase"},
          {"userId": "u2", "productId": 2, "behaviorType": "purchase"},
          {"userId": "u3", "productId": 4, "behaviorType": "cart"},
          {"userId": "u3", "productId": 5, "behaviorType": "favorite"},
          {"userId": "u4", "productId": 3, "behaviorType": "view"},
          {"userId": "u4", "productId": 5, "behaviorType": "purchase"}
        ]"#,
    )
    .map_err(|error| format!("behavior fixture should parse: {error}"))
}

#[test]
fn similarity_is_symmetric_bounded_and_deterministic() -> ContractResult {
    let features = normalize_catalog(&catalog()?).map_err(|error| error.to_string())?;
    let scorer = SimilarityScorer::new();

    for a in &features {
        for b in &features {
            let forward = scorer.similarity(a, b);
            let backward = scorer.similarity(b, a);
            require!(
                (forward - backward).abs() < 1e-12,
                "similarity({}, {}) is not symmetric: {forward} vs {backward}",
                a.id,
                b.id
            );
            require!((0.0..=1.0).contains(&forward), "similarity out of bounds: {forward}");
            require_eq!(forward.to_bits(), scorer.similarity(a, b).to_bits());
        }
    }
    Ok(())
}

#[test]
fn most_similar_never_contains_the_target() -> ContractResult {
    let catalog = catalog()?;
    for product in &catalog {
        let similar = get_similar_products(&product.id, &catalog, catalog.len())
            .map_err(|error| error.to_string())?;
        require!(!similar.contains(&product.id), "{} recommended to itself", product.id);
        require_eq!(similar.len(), catalog.len() - 1);
    }
    Ok(())
}

#[test]
fn graph_build_is_idempotent() -> ContractResult {
    let events = behaviors()?;
    require_eq!(BehaviorGraph::build(&events), BehaviorGraph::build(&events));
    Ok(())
}

#[test]
fn recommend_never_repeats_a_product() -> ContractResult {
    let catalog = catalog()?;
    let events = behaviors()?;
    let contexts = [
        RecommendationContext::for_product("1").with_seed(1),
        RecommendationContext::for_user("u1").with_seed(2),
        RecommendationContext::for_product("5").with_user("u3").with_seed(3),
        RecommendationContext::new().with_seed(4),
    ];

    for context in &contexts {
        let ranked = recommend(context, &catalog, &events, 20).map_err(|error| error.to_string())?;
        let unique: HashSet<&ProductId> = ranked.iter().collect();
        require_eq!(unique.len(), ranked.len());
    }
    Ok(())
}

#[test]
fn recommend_respects_page_size() -> ContractResult {
    let ranked = recommend(
        &RecommendationContext::for_product("1").with_seed(8),
        &catalog()?,
        &behaviors()?,
        2,
    )
    .map_err(|error| error.to_string())?;
    require_eq!(ranked.len(), 2);
    Ok(())
}

#[test]
fn same_category_beats_cross_category_on_price() -> ContractResult {
    let catalog: Vec<Product> = vec![
        Product::new("1", "fruit", 10.0),
        Product::new("2", "fruit", 12.0),
        Product::new("3", "veg", 3.0),
    ];
    let similar =
        get_similar_products(&ProductId::new("1"), &catalog, 1).map_err(|error| error.to_string())?;
    require_eq!(similar, vec![ProductId::new("2")]);
    Ok(())
}

#[test]
fn empty_behavior_log_yields_no_collaborative_candidates() -> ContractResult {
    let scores = get_collaborative_recommendations(
        &UserId::new("u1"),
        &catalog()?,
        &[],
        5,
        CollaborativeStrategy::User,
    )
    .map_err(|error| error.to_string())?;
    require!(scores.is_empty());
    Ok(())
}

#[test]
fn single_shared_purchase_makes_a_neighbor() -> ContractResult {
    let events: Vec<BehaviorEvent> = serde_json::from_str(
        r#"[
          {"userId": "u1", "productId": 1, "behaviorType": "purchase"},
          {"userId": "u2", "productId": 1, "behaviorType": "purchase"},
          {"userId": "u2", "productId": 2, "behaviorType": "purchase"}
        ]"#,
    )
    .map_err(|error| error.to_string())?;

    let scores = get_collaborative_recommendations(
        &UserId::new("u1"),
        &catalog()?,
        &events,
        5,
        CollaborativeStrategy::User,
    )
    .map_err(|error| error.to_string())?;
    require_eq!(scores, vec![ProductId::new("2")]);
    Ok(())
}

#[test]
fn single_product_catalog_has_no_bundles() -> ContractResult {
    let bundles = get_bundles(&[Product::new("1", "fruit", 2.0)]).map_err(|error| error.to_string())?;
    require!(bundles.is_empty());
    Ok(())
}

#[test]
fn missing_tags_never_score_above_matching_tags() -> ContractResult {
    let scorer = SimilarityScorer::new();
    let bare = normalize_catalog(&[Product::new("1", "fruit", 5.0), Product::new("2", "fruit", 6.0)])
        .map_err(|error| error.to_string())?;
    let tagged = normalize_catalog(&[
        Product::new("1", "fruit", 5.0).with_tags(["citrus"]),
        Product::new("2", "fruit", 6.0).with_tags(["citrus"]),
    ])
    .map_err(|error| error.to_string())?;

    let without_tags = scorer.similarity(&bare[0], &bare[1]);
    let with_tags = scorer.similarity(&tagged[0], &tagged[1]);
    require!(
        with_tags >= without_tags,
        "identical tags ({with_tags}) scored below absent tags ({without_tags})"
    );
    require!(scorer.breakdown(&bare[0], &bare[1]).tags.is_none());
    Ok(())
}

#[test]
fn graph_recommendations_are_reproducible_and_exclude_seed() -> ContractResult {
    let catalog = catalog()?;
    let events = behaviors()?;
    let seed = ProductId::new("1");

    let first = get_graph_recommendations(&seed, &catalog, &events, 5, &mut StdRng::seed_from_u64(99))
        .map_err(|error| error.to_string())?;
    let second = get_graph_recommendations(&seed, &catalog, &events, 5, &mut StdRng::seed_from_u64(99))
        .map_err(|error| error.to_string())?;

    require_eq!(first, second);
    require!(!first.contains(&seed));
    Ok(())
}

#[test]
fn unknown_target_is_an_error_but_empty_catalog_is_not() -> ContractResult {
    let unknown = recommend(
        &RecommendationContext::for_product("999").with_seed(1),
        &catalog()?,
        &behaviors()?,
        5,
    );
    require!(unknown.is_err(), "unknown target should be reported");

    let empty = recommend(&RecommendationContext::for_product("999").with_seed(1), &[], &[], 5)
        .map_err(|error| error.to_string())?;
    require!(empty.is_empty());
    Ok(())
}
