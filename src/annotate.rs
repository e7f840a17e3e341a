// memgate: Navigational Annotator (L6)
//
// Grounded on examples/original_source/main.go's setNavRels: first/last
// always; forward scan for the local-minimum closest when an
// accept-datetime is given (§4.6).

use chrono::{DateTime, Utc};

use crate::memento::{MementoList, NavRel};

/// Result of annotation: the chosen memento's href, when an accept-datetime
/// drove a closest-memento selection.
pub struct Annotation {
    pub closest_href: Option<String>,
}

/// Label `first`/`last` unconditionally, and when `accept_datetime` is
/// given, find the closest memento by a forward scan that stops at the
/// first local minimum of |time - D| (the list is sorted, so this is the
/// global minimum), labeling `prev`/`next`/`closest` around it (§4.6).
pub fn annotate(list: &mut MementoList, accept_datetime: Option<DateTime<Utc>>) -> Annotation {
    if list.is_empty() {
        return Annotation { closest_href: None };
    }

    list.front_mut().unwrap().nav_rels.insert(NavRel::First);
    list.back_mut().unwrap().nav_rels.insert(NavRel::Last);

    let Some(target) = accept_datetime else {
        return Annotation { closest_href: None };
    };

    let len = list.len();
    let mut best_idx = 0usize;
    let mut best_delta: Option<chrono::Duration> = None;
    for idx in 0..len {
        let dt = list.get_mut(idx).unwrap().datetime;
        let delta = (dt - target).abs();
        match best_delta {
            None => {
                best_delta = Some(delta);
                best_idx = idx;
            }
            Some(current_best) if delta < current_best => {
                best_delta = Some(delta);
                best_idx = idx;
            }
            Some(current_best) if delta > current_best => break,
            _ => {}
        }
    }

    let href = list.get_mut(best_idx).unwrap().href.clone();
    list.get_mut(best_idx).unwrap().nav_rels.insert(NavRel::Closest);
    if best_idx > 0 {
        list.get_mut(best_idx - 1).unwrap().nav_rels.insert(NavRel::Prev);
    }
    if best_idx + 1 < len {
        list.get_mut(best_idx + 1).unwrap().nav_rels.insert(NavRel::Next);
    }

    Annotation {
        closest_href: Some(href),
    }
}
