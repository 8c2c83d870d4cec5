//! Filter and sort of a fetched collection.
//!
//! Both passes are pure: inputs are borrowed, outputs are new vectors, and
//! nothing here fails. Missing item fields read as their documented defaults
//! (see [`capsule_types::item`]).
//!
//! Filtering is a union across active categories: an item survives when it
//! matches at least one accepted value of at least one active category.

use std::cmp::Ordering;

use capsule_types::{
    CollectionItem, FilterCategory, FilterSelection, HAS_MOMENTS, MomentsIndex, NO_MOMENTS,
    SortDirection, SortKey, SortSpec,
};

/// Keep the items accepted by `selection`.
///
/// With no active category the input is returned unchanged.
pub fn filter(
    items: &[CollectionItem],
    selection: &FilterSelection,
    moments: &MomentsIndex,
) -> Vec<CollectionItem> {
    if !selection.has_active() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| matches_any(item, selection, moments))
        .cloned()
        .collect()
}

/// Stable sort by `spec`. Equal keys keep their input order.
pub fn sort(
    items: &[CollectionItem],
    spec: SortSpec,
    moments: &MomentsIndex,
) -> Vec<CollectionItem> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| compare(a, b, spec, moments));
    sorted
}

/// Filter then sort.
pub fn apply(
    items: &[CollectionItem],
    selection: &FilterSelection,
    spec: SortSpec,
    moments: &MomentsIndex,
) -> Vec<CollectionItem> {
    let mut kept = filter(items, selection, moments);
    kept.sort_by(|a, b| compare(a, b, spec, moments));
    kept
}

fn matches_any(item: &CollectionItem, selection: &FilterSelection, moments: &MomentsIndex) -> bool {
    selection.active_categories().any(|(category, accepted)| match category {
        FilterCategory::Country => accepted.contains(item.country()),
        FilterCategory::City => accepted.contains(item.city()),
        FilterCategory::Chain => accepted.contains(item.chain()),
        FilterCategory::Year => accepted.contains(&item.collected_year().to_string()),
        FilterCategory::Moments => {
            let has_moments = moments.contains(item.event_id());
            (has_moments && accepted.contains(HAS_MOMENTS))
                || (!has_moments && accepted.contains(NO_MOMENTS))
        }
    })
}

/// Descending is the natural order of every key; ascending reverses it.
fn compare(
    a: &CollectionItem,
    b: &CollectionItem,
    spec: SortSpec,
    moments: &MomentsIndex,
) -> Ordering {
    let descending = match spec.key {
        SortKey::CollectedDate => b.collected_millis().cmp(&a.collected_millis()),
        SortKey::StartDate => b.start_millis().cmp(&a.start_millis()),
        SortKey::MomentsCount => moments
            .moments_flag(b.event_id())
            .cmp(&moments.moments_flag(a.event_id())),
        SortKey::Popularity => b.supply().cmp(&a.supply()),
    };
    match spec.direction {
        SortDirection::Desc => descending,
        SortDirection::Asc => descending.reverse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_types::{Event, NONE_PLACEHOLDER, parse_timestamp};
    use pretty_assertions::assert_eq;

    fn item(token: &str, event_id: u64) -> CollectionItem {
        CollectionItem::new(token, Event::new(event_id, format!("drop {event_id}")))
    }

    fn tokens(items: &[CollectionItem]) -> Vec<&str> {
        items.iter().map(|i| i.token_id.as_str()).collect()
    }

    fn countries() -> Vec<CollectionItem> {
        vec![
            CollectionItem::new("a", Event::new(1, "a").with_country("US")),
            CollectionItem::new("b", Event::new(2, "b").with_country("US")),
            CollectionItem::new("c", Event::new(3, "c").with_country("FR")),
            CollectionItem::new("d", Event::new(4, "d")),
            CollectionItem::new("e", Event::new(5, "e").with_country("DE")),
        ]
    }

    #[test]
    fn test_no_active_category_passes_through() {
        let items = countries();
        let selection = FilterSelection::new().with(FilterCategory::City, Vec::<String>::new());
        assert_eq!(filter(&items, &selection, &MomentsIndex::new()), items);
    }

    #[test]
    fn test_single_country_keeps_order() {
        let items = countries();
        let selection = FilterSelection::new().with(FilterCategory::Country, ["US"]);
        let kept = filter(&items, &selection, &MomentsIndex::new());
        assert_eq!(tokens(&kept), vec!["a", "b"]);
    }

    #[test]
    fn test_missing_country_matches_placeholder() {
        let items = countries();
        let selection = FilterSelection::new().with(FilterCategory::Country, [NONE_PLACEHOLDER]);
        assert_eq!(tokens(&filter(&items, &selection, &MomentsIndex::new())), vec!["d"]);
    }

    #[test]
    fn test_categories_union() {
        let items = vec![
            item("gnosis", 1).with_chain("xdai"),
            CollectionItem::new("paris", Event::new(2, "p").with_city("Paris")),
            item("neither", 3),
        ];
        let selection = FilterSelection::new()
            .with(FilterCategory::Chain, ["xdai"])
            .with(FilterCategory::City, ["Paris"]);
        assert_eq!(
            tokens(&filter(&items, &selection, &MomentsIndex::new())),
            vec!["gnosis", "paris"]
        );
    }

    #[test]
    fn test_chain_defaults_to_mainnet() {
        let items = vec![item("plain", 1), item("gnosis", 2).with_chain("xdai")];
        let selection = FilterSelection::new().with(FilterCategory::Chain, ["mainnet"]);
        assert_eq!(tokens(&filter(&items, &selection, &MomentsIndex::new())), vec!["plain"]);
    }

    #[test]
    fn test_year_uses_utc() {
        let items = vec![
            item("late", 1).collected_at(parse_timestamp("2024-01-01T00:30:00+01:00").unwrap()),
            item("new", 2).collected_at(parse_timestamp("2024-06-01").unwrap()),
            item("undated", 3),
        ];
        let selection = FilterSelection::new().with(FilterCategory::Year, ["2023", "1970"]);
        assert_eq!(
            tokens(&filter(&items, &selection, &MomentsIndex::new())),
            vec!["late", "undated"]
        );
    }

    #[test]
    fn test_moments_filter() {
        let items = vec![item("with", 1), item("without", 2)];
        let moments: MomentsIndex = [1].into_iter().collect();

        let has = FilterSelection::new().with(FilterCategory::Moments, [HAS_MOMENTS]);
        assert_eq!(tokens(&filter(&items, &has, &moments)), vec!["with"]);

        let none = FilterSelection::new().with(FilterCategory::Moments, [NO_MOMENTS]);
        assert_eq!(tokens(&filter(&items, &none, &moments)), vec!["without"]);

        let both = FilterSelection::new().with(FilterCategory::Moments, [HAS_MOMENTS, NO_MOMENTS]);
        assert_eq!(filter(&items, &both, &moments).len(), 2);
    }

    #[test]
    fn test_popularity_desc() {
        let items = vec![
            CollectionItem::new("ten", Event::new(1, "x").with_supply(10)),
            CollectionItem::new("fifty", Event::new(2, "y").with_supply(50)),
            CollectionItem::new("five", Event::new(3, "z").with_supply(5)),
        ];
        let sorted = sort(&items, SortSpec::desc(SortKey::Popularity), &MomentsIndex::new());
        let supplies: Vec<u64> = sorted.iter().map(CollectionItem::supply).collect();
        assert_eq!(supplies, vec![50, 10, 5]);
        assert_eq!(tokens(&items), vec!["ten", "fifty", "five"], "input untouched");
    }

    #[test]
    fn test_sort_is_stable_in_both_directions() {
        let items = vec![
            CollectionItem::new("first", Event::new(1, "x").with_supply(7)),
            CollectionItem::new("big", Event::new(2, "y").with_supply(9)),
            CollectionItem::new("second", Event::new(3, "z").with_supply(7)),
        ];
        let moments = MomentsIndex::new();
        assert_eq!(
            tokens(&sort(&items, SortSpec::desc(SortKey::Popularity), &moments)),
            vec!["big", "first", "second"]
        );
        assert_eq!(
            tokens(&sort(&items, SortSpec::asc(SortKey::Popularity), &moments)),
            vec!["first", "second", "big"]
        );
    }

    #[test]
    fn test_desc_is_reverse_of_asc_without_ties() {
        let dates = ["2021-03-01", "2023-01-15", "2019-11-30", "2022-07-04"];
        let items: Vec<CollectionItem> = dates
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let at = parse_timestamp(d).unwrap();
                CollectionItem::new(i.to_string(), Event::new(i as u64, "x").with_start_date(at))
                    .collected_at(at)
                    .with_chain("xdai")
            })
            .collect();
        let moments = MomentsIndex::new();

        for key in [SortKey::CollectedDate, SortKey::StartDate] {
            let desc = sort(&items, SortSpec::desc(key), &moments);
            let mut asc = sort(&items, SortSpec::asc(key), &moments);
            asc.reverse();
            assert_eq!(desc, asc, "{key}");
        }
    }

    #[test]
    fn test_moments_sort_puts_moments_first() {
        let items = vec![item("a", 1), item("b", 2), item("c", 3)];
        let moments: MomentsIndex = [2].into_iter().collect();
        assert_eq!(
            tokens(&sort(&items, SortSpec::desc(SortKey::MomentsCount), &moments)),
            vec!["b", "a", "c"]
        );
    }

    #[test]
    fn test_undated_items_sort_as_epoch() {
        let items = vec![
            item("undated", 1),
            item("dated", 2).collected_at(parse_timestamp("2020-01-01").unwrap()),
        ];
        let sorted = sort(&items, SortSpec::default(), &MomentsIndex::new());
        assert_eq!(tokens(&sorted), vec!["dated", "undated"]);
    }

    #[test]
    fn test_apply_filters_then_sorts() {
        let items = vec![
            CollectionItem::new("us-small", Event::new(1, "x").with_country("US").with_supply(1)),
            CollectionItem::new("fr", Event::new(2, "y").with_country("FR").with_supply(100)),
            CollectionItem::new("us-big", Event::new(3, "z").with_country("US").with_supply(30)),
        ];
        let selection = FilterSelection::new().with(FilterCategory::Country, ["US"]);
        let derived = apply(
            &items,
            &selection,
            SortSpec::desc(SortKey::Popularity),
            &MomentsIndex::new(),
        );
        assert_eq!(tokens(&derived), vec!["us-big", "us-small"]);
    }
}
