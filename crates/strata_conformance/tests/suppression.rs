//! Change suppression: propagation stops as soon as recomputed values
//! come out equal.

use strata_conformance::workspace;

#[test]
fn identical_content_seeds_nothing() {
    let ws = workspace(&[("a.st", "foo: int"), ("b.st", "x = a.foo")]);
    // Same bytes again: the base layer's content hash absorbs the event.
    let result = ws.write("a.st", "foo: int");
    assert_eq!(result.triggered, 0);
    assert!(result.is_quiescent());
}

#[test]
fn touch_event_without_edit_is_quiescent() {
    let ws = workspace(&[("a.st", "foo: int")]);
    let result = ws.touch("a.st");
    assert!(result.is_quiescent());
}

#[test]
fn equal_summary_stops_at_the_exports_layer() {
    let ws = workspace(&[("a.st", "foo: int"), ("b.st", "x = a.foo")]);
    assert_eq!(ws.type_name("b", "x"), "int");
    let baseline = ws.produces();

    // New bytes, same parse: only the exports producer runs.
    let result = ws.write("a.st", "# cosmetic comment\nfoo: int");

    let after = ws.produces();
    assert_eq!(after.exports, baseline.exports + 1);
    assert_eq!(after.types, baseline.types, "types layer must not be triggered");
    assert_eq!(after.errors, baseline.errors, "errors layer must not be triggered");

    let exports_report = result.layers.iter().find(|l| l.layer == "exports").unwrap();
    assert_eq!(exports_report.recomputed, 1);
    assert_eq!(exports_report.changed, 0);

    // Downstream facts are still served from cache.
    assert_eq!(ws.type_name("b", "x"), "int");
    assert_eq!(ws.produces().types, baseline.types);
}

#[test]
fn suppression_is_per_key_not_per_batch() {
    // One edit changes `a` but leaves `b`'s parse identical; only `a`'s
    // dependents recompute.
    let ws = workspace(&[
        ("a.st", "foo: int"),
        ("b.st", "bar: str"),
        ("c.st", "x = a.foo\ny = b.bar"),
    ]);
    assert_eq!(ws.type_name("c", "x"), "int");
    assert_eq!(ws.type_name("c", "y"), "str");

    ws.provider.set("a.st", "foo: bool");
    ws.provider.set("b.st", "# moved comment\nbar: str");
    ws.model.update(&[
        strata_source::ChangeEvent::modified("a.st"),
        strata_source::ChangeEvent::modified("b.st"),
    ]);

    assert_eq!(ws.type_name("c", "x"), "bool");
    // `c.y` reads only `b.bar`, whose summary is unchanged.
    let baseline = ws.produces();
    assert_eq!(ws.type_name("c", "y"), "str");
    assert_eq!(ws.produces(), baseline);
}
