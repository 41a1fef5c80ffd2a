//! End-to-end coverage of the mixin-dispatch rename scenario: a class
//! including two sibling modules whose same-named methods differ in arity,
//! alongside inheritance and override variants of the same method name.

use mixtool_core::patch::{EditSet, FileId, Span};
use mixtool_resolve::{
    plan_rename, rename_at, resolve_call, Arity, DeclId, GraphBuilder, Receiver, RenameError,
    Resolution, SymbolGraph,
};

const FIXTURE: &str = "\
module Base
end

module BaseWithMethod
  include Base

  def foo
  end
end

module OtherModuleWithMethod
  def foo(i)
  end
end

class A
  include BaseWithMethod

  def foo
  end
end

class B
  include BaseWithMethod
end

class C
  include Base

  def foo
  end
end

class D < C
end

class E
  include BaseWithMethod
  include OtherModuleWithMethod
end

A.new.foo
B.new.foo
D.new.foo
E.new.foo(1)
";

const RENAMED: &str = "\
module Base
end

module BaseWithMethod
  include Base

  def foo
  end
end

module OtherModuleWithMethod
  def bar(i)
  end
end

class A
  include BaseWithMethod

  def foo
  end
end

class B
  include BaseWithMethod
end

class C
  include Base

  def foo
  end
end

class D < C
end

class E
  include BaseWithMethod
  include OtherModuleWithMethod
end

A.new.foo
B.new.foo
D.new.foo
E.new.bar(1)
";

/// Span of the `n`th (0-based) occurrence of `needle` in `src`.
fn occurrence(src: &str, needle: &str, n: usize) -> Span {
    let mut from = 0;
    let mut count = 0;
    while let Some(pos) = src[from..].find(needle) {
        let at = from + pos;
        if count == n {
            return Span::new(at as u64, (at + needle.len()) as u64);
        }
        count += 1;
        from = at + needle.len();
    }
    panic!("occurrence {n} of '{needle}' not found");
}

struct Fixture {
    graph: SymbolGraph,
    file: FileId,
    base_with_method_foo: DeclId,
    other_module_foo: DeclId,
    a_foo: DeclId,
    c_foo: DeclId,
}

/// Name occurrences of `foo` in FIXTURE, in order: the four definitions
/// (BaseWithMethod, OtherModuleWithMethod, A, C), then the four calls
/// (A, B, D, E receivers).
fn foo_span(src: &str, n: usize) -> Span {
    occurrence(src, "foo", n)
}

fn build(src: &str, method: &str) -> Fixture {
    let mut b = GraphBuilder::new();
    let file = b.add_file("method_mixins.rb");

    let base = b.add_module("Base");
    let base_with_method = b.add_module("BaseWithMethod");
    b.include(base_with_method, base).unwrap();
    let other_module = b.add_module("OtherModuleWithMethod");

    let a = b.add_class("A", None).unwrap();
    b.include(a, base_with_method).unwrap();
    let b_class = b.add_class("B", None).unwrap();
    b.include(b_class, base_with_method).unwrap();
    let c = b.add_class("C", None).unwrap();
    b.include(c, base).unwrap();
    let d = b.add_class("D", Some(c)).unwrap();
    let e = b.add_class("E", None).unwrap();
    b.include(e, base_with_method).unwrap();
    b.include(e, other_module).unwrap();

    let def_span = |n: usize| {
        let name = occurrence(src, method, n);
        // Back up over "def " for the definition span.
        (name, Span::new(name.start - 4, name.end))
    };
    let (name, decl) = def_span(0);
    let base_with_method_foo = b
        .add_method(base_with_method, method, Arity::Fixed(0), file, name, decl)
        .unwrap();
    let (name, decl) = def_span(1);
    let other_module_foo = b
        .add_method(other_module, method, Arity::Fixed(1), file, name, decl)
        .unwrap();
    let (name, decl) = def_span(2);
    let a_foo = b
        .add_method(a, method, Arity::Fixed(0), file, name, decl)
        .unwrap();
    let (name, decl) = def_span(3);
    let c_foo = b
        .add_method(c, method, Arity::Fixed(0), file, name, decl)
        .unwrap();

    b.add_call(file, Receiver::Instance(a), method, 0, occurrence(src, method, 4))
        .unwrap();
    b.add_call(file, Receiver::Instance(b_class), method, 0, occurrence(src, method, 5))
        .unwrap();
    b.add_call(file, Receiver::Instance(d), method, 0, occurrence(src, method, 6))
        .unwrap();
    b.add_call(file, Receiver::Instance(e), method, 1, occurrence(src, method, 7))
        .unwrap();

    Fixture {
        graph: b.build(),
        file,
        base_with_method_foo,
        other_module_foo,
        a_foo,
        c_foo,
    }
}

fn fixture() -> Fixture {
    build(FIXTURE, "foo")
}

#[test]
fn calls_bind_through_mixins_inheritance_and_arity() {
    let fx = fixture();
    let bindings: Vec<Resolution> = fx
        .graph
        .call_sites()
        .map(|c| resolve_call(&fx.graph, c))
        .collect();

    assert_eq!(
        bindings,
        vec![
            // A.new.foo: A's own override shadows the mixin.
            Resolution::Bound(fx.a_foo),
            // B.new.foo: inherited from the BaseWithMethod mixin.
            Resolution::Bound(fx.base_with_method_foo),
            // D.new.foo: inherited from superclass C.
            Resolution::Bound(fx.c_foo),
            // E.new.foo(1): arity selects the one-argument sibling.
            Resolution::Bound(fx.other_module_foo),
        ]
    );
}

#[test]
fn renaming_at_the_e_call_edits_exactly_the_bound_pair() {
    let fx = fixture();
    let cursor = foo_span(FIXTURE, 7).start;
    let plan = rename_at(&fx.graph, "method_mixins.rb", cursor, "bar").unwrap();

    assert_eq!(plan.target, "OtherModuleWithMethod#foo");
    assert_eq!(plan.summary.declarations_renamed, 1);
    assert_eq!(plan.summary.call_sites_rewritten, 1);
    assert_eq!(plan.summary.files_changed, 1);
    assert!(plan.warnings.is_empty());

    let spans: Vec<Span> = plan.edits.iter().map(|e| e.span).collect();
    assert_eq!(spans, vec![foo_span(FIXTURE, 1), foo_span(FIXTURE, 7)]);
}

#[test]
fn applying_the_plan_produces_expected_source() {
    let fx = fixture();
    let plan = plan_rename(&fx.graph, fx.other_module_foo, "bar").unwrap();

    let mut set = EditSet::new();
    for edit in plan.edits {
        set.insert(edit);
    }
    assert!(set.conflicts().is_empty());
    let applied = set.apply_to(fx.file, FIXTURE).unwrap();
    assert_eq!(applied, RENAMED);
}

#[test]
fn rename_is_idempotent_across_rederivation() {
    // After applying and re-deriving the graph from the renamed program,
    // the renamed method is fully reachable under its new name and no call
    // on the old name binds anywhere near it.
    let fx = fixture();
    let plan = plan_rename(&fx.graph, fx.other_module_foo, "bar").unwrap();
    let mut set = EditSet::new();
    for edit in plan.edits {
        set.insert(edit);
    }
    let applied = set.apply_to(fx.file, FIXTURE).unwrap();

    // Re-derive, with the renamed declaration and call under "bar".
    let mut b = GraphBuilder::new();
    let file = b.add_file("method_mixins.rb");
    let other_module = b.add_module("OtherModuleWithMethod");
    let bar_name = occurrence(&applied, "bar", 0);
    let bar = b
        .add_method(
            other_module,
            "bar",
            Arity::Fixed(1),
            file,
            bar_name,
            Span::new(bar_name.start - 4, bar_name.end),
        )
        .unwrap();
    let e = b.add_class("E", None).unwrap();
    b.include(e, other_module).unwrap();
    b.add_call(file, Receiver::Instance(e), "bar", 1, occurrence(&applied, "bar", 1))
        .unwrap();
    let graph = b.build();

    let call = graph.call_sites().next().unwrap();
    assert_eq!(resolve_call(&graph, call), Resolution::Bound(bar));

    // Renaming back touches exactly the same two spans.
    let back = plan_rename(&graph, bar, "foo").unwrap();
    assert_eq!(back.summary.edits_count, 2);
}

#[test]
fn renaming_the_mixin_method_drags_the_override_and_its_calls() {
    let fx = fixture();
    let plan = plan_rename(&fx.graph, fx.base_with_method_foo, "bar").unwrap();

    // BaseWithMethod#foo and the A#foo override rename together; the calls
    // through A and B rewrite; C#foo, D's call, and E's one-argument call
    // are untouched.
    assert_eq!(plan.summary.declarations_renamed, 2);
    assert_eq!(plan.summary.call_sites_rewritten, 2);
    let spans: Vec<Span> = plan.edits.iter().map(|e| e.span).collect();
    assert_eq!(
        spans,
        vec![
            foo_span(FIXTURE, 0),
            foo_span(FIXTURE, 2),
            foo_span(FIXTURE, 4),
            foo_span(FIXTURE, 5),
        ]
    );
}

#[test]
fn renaming_the_superclass_chain_method_leaves_mixin_family_alone() {
    let fx = fixture();
    let plan = plan_rename(&fx.graph, fx.c_foo, "bar").unwrap();

    assert_eq!(plan.summary.declarations_renamed, 1);
    assert_eq!(plan.summary.call_sites_rewritten, 1);
    let spans: Vec<Span> = plan.edits.iter().map(|e| e.span).collect();
    assert_eq!(spans, vec![foo_span(FIXTURE, 3), foo_span(FIXTURE, 6)]);
}

#[test]
fn sibling_mixins_with_equal_arity_block_the_rename() {
    const SOURCE: &str = "\
module Left
  def ping
  end
end

module Right
  def ping
  end
end

class Both
  include Left
  include Right
end

Both.new.ping
";
    let mut b = GraphBuilder::new();
    let file = b.add_file("siblings.rb");
    let left = b.add_module("Left");
    let right = b.add_module("Right");
    let both = b.add_class("Both", None).unwrap();
    b.include(both, left).unwrap();
    b.include(both, right).unwrap();

    let name = occurrence(SOURCE, "ping", 0);
    let left_ping = b
        .add_method(left, "ping", Arity::Fixed(0), file, name, Span::new(name.start - 4, name.end))
        .unwrap();
    let name = occurrence(SOURCE, "ping", 1);
    b.add_method(right, "ping", Arity::Fixed(0), file, name, Span::new(name.start - 4, name.end))
        .unwrap();
    b.add_call(file, Receiver::Instance(both), "ping", 0, occurrence(SOURCE, "ping", 2))
        .unwrap();
    let graph = b.build();

    let call = graph.call_sites().next().unwrap();
    assert!(matches!(resolve_call(&graph, call), Resolution::Ambiguous(_)));

    let err = plan_rename(&graph, left_ping, "pong").unwrap_err();
    match err {
        RenameError::AmbiguousRename { candidates, .. } => {
            assert_eq!(candidates, vec!["Right#ping", "Left#ping"]);
        }
        other => panic!("expected AmbiguousRename, got {other:?}"),
    }

    let mix: mixtool_core::error::MixError = plan_rename(&graph, left_ping, "pong")
        .unwrap_err()
        .into();
    assert_eq!(mix.error_code().code(), 4);
}
