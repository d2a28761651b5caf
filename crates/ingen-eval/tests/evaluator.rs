//! End-to-end template evaluation against hand-built data stores.

use ingen_data::{DataStore, DictId, Item};
use ingen_eval::evaluate_template;
use ingen_util::Error;

/// Evaluates `source` against a fresh global scope populated by `setup`.
fn run_with(
    source: &str,
    setup: impl FnOnce(&mut DataStore, DictId),
) -> Result<String, Error> {
    let mut store = DataStore::new();
    let global = store.new_dict(None);
    setup(&mut store, global);
    let mut out = Vec::new();
    evaluate_template(source, "test.template", &mut store, global, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

fn run(source: &str) -> Result<String, Error> {
    run_with(source, |_, _| {})
}

fn expect(source: &str) -> String {
    run(source).expect("template should evaluate")
}

#[test]
fn test_literal_text() {
    assert_eq!(expect("hello world\n"), "hello world\n");
}

#[test]
fn test_empty_expression_region_is_noop() {
    assert_eq!(expect("a$$b"), "ab");
}

#[test]
fn test_integer_writeout() {
    assert_eq!(expect("$5$"), "5");
}

#[test]
fn test_string_writeout() {
    assert_eq!(expect("$\"hi\"$"), "hi");
}

#[test]
fn test_arithmetic() {
    assert_eq!(expect("$2 + 3$"), "5");
    assert_eq!(expect("$7 - 2$"), "5");
    assert_eq!(expect("$3 * 4$"), "12");
    assert_eq!(expect("$9 / 2$"), "4");
    assert_eq!(expect("$-3$"), "-3");
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    assert_eq!(expect("$2 + 3 * 4$"), "14");
}

#[test]
fn test_if_with_comparison() {
    assert_eq!(expect("$if 2 + 3 == 5$OK$end$"), "OK");
    assert_eq!(expect("$if 2 + 3 == 6$OK$end$"), "");
}

#[test]
fn test_if_comparisons() {
    assert_eq!(expect("$if 2 < 3$y$end$"), "y");
    assert_eq!(expect("$if 3 > 2$y$end$"), "y");
    assert_eq!(expect("$if 2 <= 2$y$end$"), "y");
    assert_eq!(expect("$if 2 >= 3$y$end$"), "");
    assert_eq!(expect("$if 2 != 3$y$end$"), "y");
}

#[test]
fn test_string_equality() {
    assert_eq!(expect("$if \"a\" == \"a\"$y$end$"), "y");
    assert_eq!(expect("$if \"a\" != \"b\"$y$end$"), "y");
}

#[test]
fn test_boolean_connectives() {
    assert_eq!(expect("$if 1 == 1 && 2 == 2$y$end$"), "y");
    assert_eq!(expect("$if 1 == 2 || 2 == 2$y$end$"), "y");
    assert_eq!(expect("$if !(1 == 2)$y$end$"), "y");
}

#[test]
fn test_variable_lookup() {
    let output = run_with("$Name$", |store, global| {
        store.insert(global, "Name", Item::str("widget"));
    })
    .unwrap();
    assert_eq!(output, "widget");
}

#[test]
fn test_bool_writeout() {
    let output = run_with("$Flag$", |store, global| {
        store.insert(global, "Flag", Item::bool(true));
    })
    .unwrap();
    assert_eq!(output, "True");
}

#[test]
fn test_assignment_declares_in_scope() {
    // The assignment expression itself writes its value.
    assert_eq!(expect("$x = 7$:$x$"), "7:7");
}

#[test]
fn test_assignment_to_literal_fails() {
    let err = run("$5 = 6$").unwrap_err();
    assert!(err.to_string().contains("Assignment only valid on L-Values"));
}

#[test]
fn test_post_increment_returns_pre_value() {
    assert_eq!(expect("$x = 1$$x++$$x$"), "112");
}

#[test]
fn test_post_decrement_also_advances() {
    // '--' on Int steps the value forward exactly like '++'.
    assert_eq!(expect("$x = 1$$x--$$x$"), "112");
}

#[test]
fn test_pre_increment_returns_new_value() {
    // The assignment writes "1", the pre-increment writes the stepped
    // value.
    assert_eq!(expect("$x = 1$$++x$$x$"), "122");
}

#[test]
fn test_foreach_over_list() {
    let output = run_with("$foreach N in Names$[$N$]$end$", |store, global| {
        let list = store.new_list();
        store.list_mut(list).push(Item::str("a"));
        store.list_mut(list).push(Item::str("b"));
        store.list_mut(list).push(Item::str("c"));
        store.insert(global, "Names", Item::list(list));
    })
    .unwrap();
    assert_eq!(output, "[a][b][c]");
}

#[test]
fn test_foreach_empty_list_produces_nothing() {
    let output = run_with("$foreach N in Names$[$N$]$end$after", |store, global| {
        let list = store.new_list();
        store.insert(global, "Names", Item::list(list));
    })
    .unwrap();
    assert_eq!(output, "after");
}

#[test]
fn test_foreach_empty_list_does_not_bind_variable() {
    let err = run_with("$foreach N in Names$$end$$N$", |store, global| {
        let list = store.new_list();
        store.insert(global, "Names", Item::list(list));
    })
    .unwrap_err();
    assert!(err.to_string().contains("Unknown identifier \"N\""));
}

#[test]
fn test_list_size() {
    let output = run_with("$Items.Size$", |store, global| {
        let list = store.new_list();
        store.list_mut(list).push(Item::int(10));
        store.list_mut(list).push(Item::int(20));
        store.insert(global, "Items", Item::list(list));
    })
    .unwrap();
    assert_eq!(output, "2");
}

#[test]
fn test_list_indexing() {
    let output = run_with("$Items[1]$", |store, global| {
        let list = store.new_list();
        store.list_mut(list).push(Item::str("zero"));
        store.list_mut(list).push(Item::str("one"));
        store.insert(global, "Items", Item::list(list));
    })
    .unwrap();
    assert_eq!(output, "one");
}

#[test]
fn test_list_index_out_of_range() {
    let err = run_with("$Items[3]$", |store, global| {
        let list = store.new_list();
        store.list_mut(list).push(Item::int(1));
        store.insert(global, "Items", Item::list(list));
    })
    .unwrap_err();
    assert!(err.to_string().contains("out of range"));
}

#[test]
fn test_member_access() {
    let output = run_with("$S.Name$", |store, global| {
        let dict = store.new_dict(None);
        store.insert(dict, "Name", Item::str("Foo"));
        store.insert(global, "S", Item::dict(dict));
    })
    .unwrap();
    assert_eq!(output, "Foo");
}

#[test]
fn test_for_loop() {
    assert_eq!(expect("$for i = 0; i < 3; i++$x$end$"), "xxx");
}

#[test]
fn test_for_loop_counter_visible_in_body() {
    assert_eq!(expect("$for i = 0; i < 3; i = i + 1$$i$ $end$"), "0 1 2 ");
}

#[test]
fn test_define_and_call() {
    assert_eq!(
        expect("$definitions$$define Say(n)$Hello $n$!\n$end$$end$$Say(\"world\")$"),
        "Hello world!\n"
    );
}

#[test]
fn test_procedure_arguments_are_expressions() {
    assert_eq!(
        expect("$definitions$$define Twice(v)$$v$$v$$end$$end$$Twice(2 + 3)$"),
        "55"
    );
}

#[test]
fn test_procedure_arity_errors() {
    let err = run("$definitions$$define P(a, b)$$end$$end$$P()$").unwrap_err();
    assert!(err.to_string().contains("requires 2 arguments"));

    let err = run("$definitions$$define Q()$$end$$end$$Q(1)$").unwrap_err();
    assert!(err.to_string().contains("Too many args"));
}

#[test]
fn test_call_to_unknown_procedure() {
    let err = run("$Missing(1)$").unwrap_err();
    assert!(err.to_string().contains("Could not find procedure \"Missing\""));
}

#[test]
fn test_call_to_non_procedure() {
    let err = run_with("$V(1)$", |store, global| {
        store.insert(global, "V", Item::int(3));
    })
    .unwrap_err();
    assert!(err.to_string().contains("is not a procedure"));
}

#[test]
fn test_begin_tab_indents_body() {
    assert_eq!(
        expect("foo\n$begin_tab$bar\n$end$baz\n"),
        "foo\n    bar\nbaz\n"
    );
}

#[test]
fn test_nested_begin_tab() {
    assert_eq!(
        expect("$begin_tab$$begin_tab$x\n$end$$end$"),
        "        x\n"
    );
}

#[test]
fn test_block_body_indentation_is_stripped() {
    assert_eq!(
        expect("$if 1 == 1$\n    indented\n$end$after\n"),
        "\nindented\nafter\n"
    );
}

#[test]
fn test_ignore_new_line_joins_lines() {
    assert_eq!(expect("a$ignore_new_line$\nb"), "ab");
}

#[test]
fn test_ignore_new_line_without_newline() {
    assert_eq!(expect("a$ignore_new_line$b"), "ab");
}

#[test]
fn test_definitions_suppresses_newlines() {
    assert_eq!(expect("$definitions$\n\n\n$end$x"), "x");
}

#[test]
fn test_breakpoint_is_noop() {
    assert_eq!(expect("a$breakpoint$b"), "ab");
}

#[test]
fn test_has_attribute() {
    let source = "$if has_attribute(F, \"Pub\")$P $end$$if has_attribute(F, \"Hidden\")$H$end$";
    let output = run_with(source, |store, global| {
        let attrs = store.new_attr_list();
        store.attr_list_mut(attrs).names.push("Pub".to_string());
        let mut field = Item::int(1);
        field.attrs = Some(attrs);
        store.insert(global, "F", field);
    })
    .unwrap();
    assert_eq!(output, "P ");
}

#[test]
fn test_has_attribute_without_attributes() {
    let output = run_with("$if has_attribute(F, \"Pub\")$P$end$-", |store, global| {
        store.insert(global, "F", Item::int(1));
    })
    .unwrap();
    assert_eq!(output, "-");
}

#[test]
fn test_string_index_reads_attribute_data() {
    let output = run_with("$F[\"Doc\"].text$", |store, global| {
        let args = store.new_dict(None);
        store.insert(args, "text", Item::str("\"hello\""));
        let data = store.new_dict(None);
        store.insert(data, "Doc", Item::dict(args));
        let attrs = store.new_attr_list();
        {
            let list = store.attr_list_mut(attrs);
            list.names.push("Doc".to_string());
            list.data = Some(data);
        }
        let mut field = Item::int(1);
        field.attrs = Some(attrs);
        store.insert(global, "F", field);
    })
    .unwrap();
    assert_eq!(output, "\"hello\"");
}

#[test]
fn test_unknown_identifier_error() {
    let err = run("$nope$").unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("test.template:"));
    assert!(message.contains("Unknown identifier \"nope\""));
}

#[test]
fn test_if_condition_must_be_bool() {
    let err = run("$if 1$x$end$").unwrap_err();
    assert!(err.to_string().contains("does not evaluate to a bool"));
}

#[test]
fn test_foreach_requires_list() {
    let err = run_with("$foreach X in V$$end$", |store, global| {
        store.insert(global, "V", Item::int(3));
    })
    .unwrap_err();
    assert!(err.to_string().contains("did not evaluate to a list"));
}

#[test]
fn test_invalid_operator_for_type() {
    let err = run("$if \"a\" && \"b\"$x$end$").unwrap_err();
    assert!(err
        .to_string()
        .contains("Operator \"&&\" not valid on type \"String\""));
}

#[test]
fn test_invalid_cast_between_types() {
    let err = run("$1 + \"x\"$").unwrap_err();
    assert!(err
        .to_string()
        .contains("Invalid cast from type \"Int\" to \"String\""));
}

#[test]
fn test_division_by_zero() {
    let err = run("$1 / 0$").unwrap_err();
    assert!(err.to_string().contains("Division by zero"));
}

#[test]
fn test_stray_end_is_illegal() {
    let err = run("$end$").unwrap_err();
    assert!(err.to_string().contains("Illegal expression"));
}

#[test]
fn test_missing_end_reports_unclosed_scope() {
    let err = run("$if 1 == 2$never closed").unwrap_err();
    assert!(err.to_string().contains("missing an end"));
}

#[test]
fn test_scope_nesting_limit() {
    let mut source = String::new();
    for _ in 0..70 {
        source.push_str("$begin_tab$");
    }
    let err = run(&source).unwrap_err();
    assert!(err.to_string().contains("nested too deep"));
}

#[test]
fn test_incomplete_string_reports_location() {
    let err = run("$\"oops").unwrap_err();
    assert!(err.to_string().contains("Incomplete string"));
}

#[test]
fn test_procedure_captures_defining_scope() {
    // The body reads a global through the captured parent scope even
    // though the call site introduced no such name.
    let output = run_with(
        "$definitions$$define Show()$$Name$$end$$end$$foreach N in L$$Show()$$end$",
        |store, global| {
            store.insert(global, "Name", Item::str("g"));
            let list = store.new_list();
            store.list_mut(list).push(Item::int(1));
            store.list_mut(list).push(Item::int(2));
            store.insert(global, "L", Item::list(list));
        },
    )
    .unwrap();
    assert_eq!(output, "gg");
}

#[test]
fn test_loop_variable_mutation_does_not_write_back() {
    let output = run_with(
        "$foreach N in L$$N = N + 1$$end$:$L[0]$",
        |store, global| {
            let list = store.new_list();
            store.list_mut(list).push(Item::int(5));
            store.insert(global, "L", Item::list(list));
        },
    )
    .unwrap();
    // The assignment writes (and prints) 6, the list still holds 5.
    assert_eq!(output, "6:5");
}
