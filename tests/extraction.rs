//! End-to-end extraction: compile a pattern, parse a document, fill records.

use grape::{compile, Document, FieldError, FindError};
use std::collections::BTreeMap;

#[derive(Debug, Default, PartialEq)]
struct Item {
    id: String,
    name: String,
}

grape::record!(Item { id as "ID", name as "Name" });

#[derive(Debug, Default, PartialEq)]
struct Priced {
    id: String,
    price: Option<u32>,
}

grape::record!(Priced { id as "ID", price as "Price" });

fn item(id: &str, name: &str) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
    }
}

#[test]
fn test_two_items_in_document_order() {
    let pattern = compile("div.item (data-id ID)\n\tspan.name (text Name)").unwrap();
    let doc = Document::parse(
        r#"<div class="item" data-id="1"><span class="name">First</span></div>
           <div class="item" data-id="2"><span class="name">Second</span></div>"#,
    );

    let mut items: Vec<Item> = Vec::new();
    pattern.find_all(&doc, &mut items).unwrap();

    assert_eq!(items, vec![item("1", "First"), item("2", "Second")]);
}

#[test]
fn test_optional_regex_miss_leaves_field_unset() {
    let pattern = compile("div.item (data-id ID)\n\t?span.price (text=/\\$([0-9]+)/ Price)").unwrap();
    let doc = Document::parse(
        r#"<div class="item" data-id="a"><span class="price">free</span></div>
           <div class="item" data-id="b"><span class="price">$15</span></div>
           <div class="item" data-id="c"></div>"#,
    );

    let mut items: Vec<Priced> = Vec::new();
    pattern.find_all(&doc, &mut items).unwrap();

    let prices: Vec<_> = items.iter().map(|i| (i.id.as_str(), i.price)).collect();
    assert_eq!(prices, vec![("a", None), ("b", Some(15)), ("c", None)]);
}

#[test]
fn test_filter_chain() {
    let pattern = compile("p (text Name.strip.lower)").unwrap();
    let doc = Document::parse("<p> ABC </p>");

    let mut record = Item::default();
    pattern.find(&doc, &mut record).unwrap();

    assert_eq!(record.name, "abc");
}

#[test]
fn test_unknown_filter_aborts() {
    let pattern = compile("p (text Name.shout)").unwrap();
    let doc = Document::parse("<p>abc</p>");

    let mut record = Item::default();
    let err = pattern.find(&doc, &mut record).unwrap_err();

    assert!(matches!(err, FindError::UnknownFilter(name) if name == "shout"));
}

#[test]
fn test_unknown_field_aborts() {
    let pattern = compile("p (text Title)").unwrap();
    let doc = Document::parse("<p>abc</p>");

    let mut record = Item::default();
    let err = pattern.find(&doc, &mut record).unwrap_err();

    match err {
        FindError::Assign { field, source } => {
            assert_eq!(field, "Title");
            assert_eq!(source, FieldError::UnknownField("Title".to_string()));
        }
        other => panic!("expected assign error, got {:?}", other),
    }
}

#[test]
fn test_unknown_field_rejected_before_matching() {
    // The unknown target sits on an optional node that never matches
    let pattern = compile("p (text Name)\n\t?table (text Title)").unwrap();
    let doc = Document::parse("<p>abc</p>");

    let mut record = Item::default();
    let err = pattern.find(&doc, &mut record).unwrap_err();

    assert!(matches!(err, FindError::Assign { field, .. } if field == "Title"));
    assert_eq!(record, Item::default());
}

#[test]
fn test_numeric_overflow_aborts() {
    #[derive(Default)]
    struct Small {
        count: u8,
    }
    grape::record!(Small { count as "Count" });

    let pattern = compile("span (text Count)").unwrap();
    let doc = Document::parse("<span>300</span>");

    let mut record = Small::default();
    let err = pattern.find(&doc, &mut record).unwrap_err();

    assert!(matches!(
        err,
        FindError::Assign {
            source: FieldError::Overflow { kind: "u8", .. },
            ..
        }
    ));
}

#[test]
fn test_missing_attribute_moves_on() {
    let pattern = compile("a (href ID)").unwrap();
    let doc = Document::parse(r#"<a>no link</a><a href="/x">link</a>"#);

    let mut items: Vec<Item> = Vec::new();
    pattern.find_all(&doc, &mut items).unwrap();

    assert_eq!(items, vec![item("/x", "")]);
}

#[test]
fn test_required_child_rejects_candidate() {
    let pattern = compile("div.item (data-id ID)\n\tspan.name (text Name)").unwrap();
    let doc = Document::parse(
        r#"<div class="item" data-id="1"></div>
           <div class="item" data-id="2"><span class="name">Kept</span></div>"#,
    );

    let mut items: Vec<Item> = Vec::new();
    pattern.find_all(&doc, &mut items).unwrap();

    assert_eq!(items, vec![item("2", "Kept")]);
}

#[test]
fn test_required_top_level_rule_without_match() {
    let pattern = compile("table (text Name)").unwrap();
    let doc = Document::parse("<p>nothing tabular</p>");

    let mut items: Vec<Item> = Vec::new();
    let err = pattern.find_all(&doc, &mut items).unwrap_err();

    assert!(matches!(err, FindError::NoMatch { selector } if selector == "table"));
    assert!(items.is_empty());
}

#[test]
fn test_failed_find_all_leaves_list_untouched() {
    let doc = Document::parse("<ul><li>a<b>x</b></li><li>b<b>y</b></li></ul>");
    let mut items = vec![item("kept", "kept")];

    let pattern = compile("li (text Name)\n\t?b (text ID.bogus)").unwrap();
    let err = pattern.find_all(&doc, &mut items).unwrap_err();
    assert!(matches!(err, FindError::UnknownFilter(_)));
    assert_eq!(items, vec![item("kept", "kept")]);

    let pattern = compile("li (text Name)\ntable (text ID)").unwrap();
    let err = pattern.find_all(&doc, &mut items).unwrap_err();
    assert!(matches!(err, FindError::NoMatch { selector } if selector == "table"));
    assert_eq!(items, vec![item("kept", "kept")]);
}

#[test]
fn test_find_all_appends_to_existing_list() {
    let doc = Document::parse("<ul><li>a</li></ul>");
    let mut items = vec![item("", "first")];

    compile("li (text Name)").unwrap().find_all(&doc, &mut items).unwrap();

    assert_eq!(items, vec![item("", "first"), item("", "a")]);
}

#[test]
fn test_optional_top_level_rule_without_match() {
    let pattern = compile("?table (text Name)").unwrap();
    let doc = Document::parse("<p>nothing tabular</p>");

    let mut items: Vec<Item> = Vec::new();
    pattern.find_all(&doc, &mut items).unwrap();

    assert!(items.is_empty());
}

#[test]
fn test_child_rule_matches_deep_descendant() {
    let pattern = compile("section (id ID)\n\tspan.name (text Name)").unwrap();
    let doc = Document::parse(
        r#"<section id="s"><div><ul><li><span class="name">deep</span></li></ul></div></section>"#,
    );

    let mut items: Vec<Item> = Vec::new();
    pattern.find_all(&doc, &mut items).unwrap();

    assert_eq!(items, vec![item("s", "deep")]);
}

#[test]
fn test_nested_matches_are_collected_innermost_first() {
    let pattern = compile("div.item (data-id ID)").unwrap();
    let doc = Document::parse(
        r#"<div class="item" data-id="outer">
             <div class="item" data-id="inner"></div>
           </div>
           <div class="item" data-id="after"></div>"#,
    );

    let mut items: Vec<Item> = Vec::new();
    pattern.find_all(&doc, &mut items).unwrap();

    let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["inner", "outer", "after"]);
}

#[test]
fn test_single_record_keeps_last_match() {
    let pattern = compile("li (text Name)").unwrap();
    let doc = Document::parse("<ul><li>one</li><li>two</li><li>three</li></ul>");

    let mut record = Item::default();
    pattern.find(&doc, &mut record).unwrap();

    assert_eq!(record.name, "three");
}

#[test]
fn test_list_field_appends_every_match() {
    #[derive(Default)]
    struct Tags {
        tags: Vec<String>,
    }
    grape::record!(Tags { tags as "Tag" });

    let pattern = compile("li (text Tag.upper)").unwrap();
    let doc = Document::parse("<ul><li>a</li><li>b</li></ul>");

    let mut record = Tags::default();
    pattern.find(&doc, &mut record).unwrap();

    assert_eq!(record.tags, vec!["A", "B"]);
}

#[test]
fn test_html_capture_with_notags() {
    let pattern = compile("div (html Name.notags) (html ID)").unwrap();
    let doc = Document::parse("<div><b>bold</b> text</div>");

    let mut record = Item::default();
    pattern.find(&doc, &mut record).unwrap();

    assert_eq!(record.name, "bold text");
    assert_eq!(record.id, "<b>bold</b> text");
}

#[test]
fn test_regex_groups_bind_in_order() {
    let pattern = compile(r"a (href=/id=(\d+)&name=(\w+)/ ID Name)").unwrap();
    let doc = Document::parse(r#"<a href="/apps?id=42&amp;name=grape">x</a>"#);

    let mut record = Item::default();
    pattern.find(&doc, &mut record).unwrap();

    assert_eq!(record, item("42", "grape"));
}

#[test]
fn test_non_participating_group_binds_empty() {
    let pattern = compile(r"a (href=/id=(\d+)|name=(\w+)/ ID Name)").unwrap();
    let doc = Document::parse(r#"<a href="?name=only">x</a><a href="?id=7">y</a>"#);

    let mut items: Vec<Item> = Vec::new();
    pattern.find_all(&doc, &mut items).unwrap();

    assert_eq!(items, vec![item("", "only"), item("7", "")]);
}

#[test]
fn test_more_groups_than_targets_never_matches() {
    let pattern = compile(r"a (href=/(\w+)=(\d+)/ ID)").unwrap();
    let doc = Document::parse(r#"<a href="id=42">x</a>"#);

    let mut items: Vec<Item> = Vec::new();
    let err = pattern.find_all(&doc, &mut items).unwrap_err();
    assert!(matches!(err, FindError::NoMatch { .. }));

    let optional = compile("p (text Name)\n\t?a (href=/(\\w+)=(\\d+)/ ID)").unwrap();
    let doc = Document::parse(r#"<p>para <a href="id=42">x</a></p>"#);
    let mut record = Item::default();
    optional.find(&doc, &mut record).unwrap();
    assert_eq!(record, item("", "para x"));
}

#[test]
fn test_several_targets_without_regex_share_the_value() {
    let pattern = compile("h1 (text ID.lower Name)").unwrap();
    let doc = Document::parse("<h1>Grape</h1>");

    let mut record = Item::default();
    pattern.find(&doc, &mut record).unwrap();

    assert_eq!(record, item("grape", "Grape"));
}

#[test]
fn test_local_filter_overrides_builtin() {
    let mut pattern = compile("p (text Name.lower) (text ID.slug)").unwrap();
    pattern
        .register_filter("lower", |s| format!("<{}>", s))
        .unwrap()
        .register_filter("slug", |s| s.replace(' ', "-"))
        .unwrap();
    let doc = Document::parse("<p>Big Grape</p>");

    let mut record = Item::default();
    pattern.find(&doc, &mut record).unwrap();

    assert_eq!(record, item("Big-Grape", "<Big Grape>"));
}

#[test]
fn test_every_top_level_rule_runs() {
    let pattern = compile("h1 (text Name)\nfooter (data-id ID)").unwrap();
    let doc = Document::parse(r#"<h1>Title</h1><footer data-id="f"></footer>"#);

    let mut record = Item::default();
    pattern.find(&doc, &mut record).unwrap();

    assert_eq!(record, item("f", "Title"));
}

#[test]
fn test_dynamic_record() {
    let pattern = compile("a (href Link) (text Label.strip)").unwrap();
    let doc = Document::parse(r#"<a href="/home"> Home </a><a href="/about">About</a>"#);

    let mut rows: Vec<BTreeMap<String, String>> = Vec::new();
    pattern.find_all(&doc, &mut rows).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["Link"], "/home");
    assert_eq!(rows[0]["Label"], "Home");
    assert_eq!(rows[1]["Label"], "About");
}

#[test]
fn test_pattern_shared_across_threads() {
    let pattern = std::sync::Arc::new(compile("li (text Name)").unwrap());
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let pattern = pattern.clone();
            std::thread::spawn(move || {
                let doc = Document::parse(&format!("<li>{}</li>", n));
                let mut record = Item::default();
                pattern.find(&doc, &mut record).unwrap();
                record.name
            })
        })
        .collect();

    let names: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(names, vec!["0", "1", "2", "3"]);
}
