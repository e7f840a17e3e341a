// memgate: JSON serializer
//
// Grounded on examples/original_source/main.go's serializeLinks "json" case
// and repsonse.go's Response/MementoList field shapes, rebuilt over
// serde_json::Value instead of hand-assembled string fragments.

use serde_json::{json, Map, Value};

use super::SerializeContext;
use crate::memento::MementoList;

fn entry(href: &str, datetime: &chrono::DateTime<chrono::Utc>) -> Value {
    json!({
        "datetime": datetime.to_rfc3339(),
        "uri": href,
    })
}

pub fn render(ctx: &SerializeContext, list: &MementoList) -> Vec<String> {
    let urir = &ctx.urir;
    let mut root = Map::new();
    root.insert("original_uri".to_string(), json!(urir));
    if !ctx.navonly {
        root.insert("self".to_string(), json!(format!("{}/json/{urir}", ctx.map_base)));
    }

    let mut mementos = Map::new();
    if !ctx.navonly {
        let list_entries: Vec<Value> = list.iter().map(|m| entry(&m.href, &m.datetime)).collect();
        mementos.insert("list".to_string(), Value::Array(list_entries));
    }
    for m in list.iter() {
        for rel in &m.nav_rels {
            mementos.insert(rel.as_str().to_string(), entry(&m.href, &m.datetime));
        }
    }
    root.insert("mementos".to_string(), Value::Object(mementos));

    root.insert(
        "timemap_uri".to_string(),
        json!({
            "link_format": format!("{}/link/{urir}", ctx.map_base),
            "json_format": format!("{}/json/{urir}", ctx.map_base),
            "cdxj_format": format!("{}/cdxj/{urir}", ctx.map_base),
        }),
    );
    root.insert("timegate_uri".to_string(), json!(format!("{}/{urir}", ctx.gate_base)));

    let body = serde_json::to_string_pretty(&Value::Object(root)).unwrap_or_default();
    vec![body]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memento::{Memento, NavRel};
    use chrono::{TimeZone, Utc};

    fn ctx(navonly: bool) -> SerializeContext {
        SerializeContext {
            urir: "http://example.com".to_string(),
            map_base: "http://memgate.example/timemap".to_string(),
            gate_base: "http://memgate.example/timegate".to_string(),
            navonly,
        }
    }

    #[test]
    fn navonly_omits_self_and_list_but_keeps_nav_keys() {
        let mut list = MementoList::new();
        let dt = Utc.with_ymd_and_hms(2005, 1, 1, 0, 0, 0).unwrap();
        let mut m = Memento::new("http://x/1".to_string(), dt, "n/a".to_string());
        m.nav_rels.insert(NavRel::Closest);
        list.insert_sorted(m);

        let chunks = render(&ctx(true), &list);
        let parsed: Value = serde_json::from_str(&chunks[0]).unwrap();
        assert!(parsed.get("self").is_none());
        assert!(parsed["mementos"].get("list").is_none());
        assert_eq!(parsed["mementos"]["closest"]["uri"], "http://x/1");
    }

    #[test]
    fn full_mode_includes_list_and_self() {
        let mut list = MementoList::new();
        let dt = Utc.with_ymd_and_hms(2005, 1, 1, 0, 0, 0).unwrap();
        list.insert_sorted(Memento::new("http://x/1".to_string(), dt, "n/a".to_string()));

        let chunks = render(&ctx(false), &list);
        let parsed: Value = serde_json::from_str(&chunks[0]).unwrap();
        assert_eq!(parsed["self"], "http://memgate.example/timemap/json/http://example.com");
        assert_eq!(parsed["mementos"]["list"].as_array().unwrap().len(), 1);
    }
}
