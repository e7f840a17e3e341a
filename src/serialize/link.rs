// memgate: Link-format serializer
//
// Grounded on examples/original_source/main.go's serializeLinks "link" case.

use crate::datetime::format_rfc1123;
use crate::memento::{Memento, NavRel};

use super::SerializeContext;
use crate::memento::MementoList;

const NAV_REL_ORDER: [NavRel; 5] = [NavRel::First, NavRel::Last, NavRel::Prev, NavRel::Next, NavRel::Closest];

/// Space-joined nav-rels in canonical order, followed by `memento` unless
/// the set contains `closest` — in which case `memento` is omitted (§4.7,
/// preserved verbatim per the open question in spec.md §9(a): do not
/// collapse this asymmetry with the JSON/CDXJ serializers).
fn rel_attr(m: &Memento) -> String {
    let labels: Vec<&str> = NAV_REL_ORDER
        .iter()
        .copied()
        .filter(|r| m.nav_rels.contains(r))
        .map(|r| r.as_str())
        .collect();
    if m.nav_rels.contains(&NavRel::Closest) {
        labels.join(" ")
    } else if labels.is_empty() {
        "memento".to_string()
    } else {
        format!("{} memento", labels.join(" "))
    }
}

pub fn render(ctx: &SerializeContext, list: &MementoList) -> Vec<String> {
    let urir = &ctx.urir;
    let mut chunks = Vec::new();

    chunks.push(format!("<{urir}>; rel=\"original\",\n"));
    if !ctx.navonly {
        chunks.push(format!(
            "<{}/link/{urir}>; rel=\"self\"; type=\"application/link-format\",\n",
            ctx.map_base
        ));
    }

    for m in list.iter() {
        if ctx.navonly && !m.has_nav_rels() {
            continue;
        }
        chunks.push(format!(
            "<{}>; rel=\"{}\"; datetime=\"{}\",\n",
            m.href,
            rel_attr(m),
            format_rfc1123(&m.datetime)
        ));
    }

    chunks.push(format!(
        "<{}/link/{urir}>; anchor=\"{urir}\"; rel=\"timemap\"; type=\"application/link-format\",\n",
        ctx.map_base
    ));
    chunks.push(format!(
        "<{}/json/{urir}>; anchor=\"{urir}\"; rel=\"timemap\"; type=\"application/json\",\n",
        ctx.map_base
    ));
    chunks.push(format!(
        "<{}/cdxj/{urir}>; anchor=\"{urir}\"; rel=\"timemap\"; type=\"application/cdxj+ors\",\n",
        ctx.map_base
    ));
    chunks.push(format!("<{}/{urir}>; anchor=\"{urir}\"; rel=\"timegate\"\n", ctx.gate_base));

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ctx(navonly: bool) -> SerializeContext {
        SerializeContext {
            urir: "http://example.com".to_string(),
            map_base: "http://memgate.example/timemap".to_string(),
            gate_base: "http://memgate.example/timegate".to_string(),
            navonly,
        }
    }

    fn memento_with(href: &str, rels: &[NavRel]) -> Memento {
        let dt = Utc.with_ymd_and_hms(2005, 1, 1, 0, 0, 0).unwrap();
        let mut m = crate::memento::Memento::new(href.to_string(), dt, "Sat, 01 Jan 2005 00:00:00 GMT".to_string());
        for r in rels {
            m.nav_rels.insert(*r);
        }
        m
    }

    #[test]
    fn closest_rel_omits_memento_keyword() {
        let m = memento_with("http://x/1", &[NavRel::Closest]);
        assert_eq!(rel_attr(&m), "closest");
    }

    #[test]
    fn plain_memento_has_no_nav_rels() {
        let m = memento_with("http://x/1", &[]);
        assert_eq!(rel_attr(&m), "memento");
    }

    #[test]
    fn first_rel_keeps_memento_keyword() {
        let m = memento_with("http://x/1", &[NavRel::First]);
        assert_eq!(rel_attr(&m), "first memento");
    }

    #[test]
    fn navonly_omits_self_entry_and_plain_mementos() {
        let mut list = MementoList::new();
        list.insert_sorted(memento_with("http://x/1", &[NavRel::First]));
        list.insert_sorted(memento_with("http://x/2", &[]));
        let chunks = render(&ctx(true), &list);
        let joined = chunks.join("");
        assert!(!joined.contains("rel=\"self\""));
        assert!(joined.contains("http://x/1"));
        assert!(!joined.contains("http://x/2"));
    }
}
