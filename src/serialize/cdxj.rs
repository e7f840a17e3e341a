// memgate: CDXJ serializer
//
// Grounded on examples/original_source/main.go's serializeLinks "cdxj"
// case. The original emits `"rel"="%s"` in its per-record JSON object,
// which is not valid JSON; reproduced here as `"rel": "%s"` rather than
// carrying the bug forward into a format other tooling parses as JSON.
//
// Header line prefixes (`!context`/`!id`/`!keys`/`!meta`) and the
// two-`!meta`-line shape follow spec.md's CDXJ section verbatim, not the
// `@`-prefixed/three-`@meta` shape main.go happens to emit.

use crate::memento::{Memento, NavRel};

use super::SerializeContext;
use crate::memento::MementoList;

const NAV_REL_ORDER: [NavRel; 5] = [NavRel::First, NavRel::Last, NavRel::Prev, NavRel::Next, NavRel::Closest];

fn rel_attr(m: &Memento) -> String {
    let labels: Vec<&str> = NAV_REL_ORDER
        .iter()
        .copied()
        .filter(|r| m.nav_rels.contains(r))
        .map(|r| r.as_str())
        .collect();
    if labels.is_empty() {
        "memento".to_string()
    } else {
        format!("{} memento", labels.join(" "))
    }
}

pub fn render(ctx: &SerializeContext, list: &MementoList) -> Vec<String> {
    let urir = &ctx.urir;
    let mut chunks = Vec::new();

    chunks.push("!context [\"http://tools.ietf.org/html/rfc7089\"]\n".to_string());
    if !ctx.navonly {
        chunks.push(format!("!id {{\"uri\": \"{}/cdxj/{urir}\"}}\n", ctx.map_base));
    }
    chunks.push("!keys [\"memento_datetime_YYYYMMDDhhmmss\"]\n".to_string());
    chunks.push(format!("!meta {{\"original_uri\": \"{urir}\"}}\n"));
    chunks.push(format!(
        "!meta {{\"timegate_uri\": \"{0}/{urir}\", \"timemap_uri\": {{\"link_format\": \"{1}/link/{urir}\", \"json_format\": \"{1}/json/{urir}\", \"cdxj_format\": \"{1}/cdxj/{urir}\"}}}}\n",
        ctx.gate_base, ctx.map_base
    ));

    for m in list.iter() {
        if ctx.navonly && !m.has_nav_rels() {
            continue;
        }
        chunks.push(format!(
            "{} {{\"uri\": \"{}\", \"rel\": \"{}\", \"datetime\": \"{}\"}}\n",
            m.datetime_key,
            m.href,
            rel_attr(m),
            crate::datetime::format_rfc1123(&m.datetime)
        ));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(navonly: bool) -> SerializeContext {
        SerializeContext {
            urir: "http://example.com".to_string(),
            map_base: "http://memgate.example/timemap".to_string(),
            gate_base: "http://memgate.example/timegate".to_string(),
            navonly,
        }
    }

    #[test]
    fn empty_navonly_result_emits_only_headers() {
        let list = MementoList::new();
        let chunks = render(&ctx(true), &list);
        assert!(chunks.iter().any(|c| c.starts_with("!context")));
        assert!(chunks.iter().any(|c| c.starts_with("!keys")));
        assert_eq!(chunks.iter().filter(|c| c.starts_with("!meta")).count(), 2);
        assert!(!chunks.iter().any(|c| c.starts_with("!id")));
        assert!(chunks.iter().all(|c| c.starts_with('!')));
    }
}
