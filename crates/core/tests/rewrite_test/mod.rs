use super::common::{apply, rewrite};
use insta::assert_snapshot;
use spatch::RewriteErrorKind;

#[test]
fn test_bare_identifier() {
    let out = rewrite("@@\n@@\n-foo\n+bar\n", "package a; func b(){ foo() }");
    assert_snapshot!(out, @"package a; func b(){ bar() }");
}

#[test]
fn test_loop_header_is_kept() {
    let patch = "@@\n@@\n for ... {\n-\tf(i)\n+\tg(i)\n }\n";
    let src = "package a

func h() {
	for i := 0; i < n; i++ {
		f(i)
	}
	for _, i := range xs {
		f(i)
	}
}
";
    assert_snapshot!(rewrite(patch, src), @r###"
package a

func h() {
	for i := 0; i < n; i++ {
		g(i)
	}
	for _, i := range xs {
		g(i)
	}
}
"###);
}

#[test]
fn test_trailing_dots_keep_arguments() {
    let patch = "@@\n@@\n-foo(bar, ...)\n+foo(bar, ..., qux)\n";
    let src = "package a\n\nfunc f() {\n\tfoo(bar, 1, 2, 3)\n}\n";
    assert_eq!(
        rewrite(patch, src),
        "package a\n\nfunc f() {\n\tfoo(bar, 1, 2, 3, qux)\n}\n"
    );
}

#[test]
fn test_unpaired_dots() {
    let patch = "@@\n@@\n-foo(...)\n x()\n+bar(...)\n";
    let src = "package a\n\nfunc f() {\n\tfoo(1)\n\tx()\n}\n";
    let err = apply(patch, src).expect_err("dots on different hunks");
    assert_eq!(err.kind, RewriteErrorKind::MissingCapture);
    assert!(err.to_string().contains("match data not found"));
}

#[test]
fn test_no_match_is_identity() {
    let src = "package a\n\n// F does.\nfunc F(a, b int) int {\n\treturn a+b // sum\n}\n";
    assert_eq!(rewrite("@@\n@@\n-foo()\n+bar()\n", src), src);
}

#[test]
fn test_delete_statement() {
    let src = "package a\n\nfunc f() {\n\ta()\n\tx()\n\tb()\n}\n";
    assert_eq!(
        rewrite("@@\n@@\n-x()\n", src),
        "package a\n\nfunc f() {\n\ta()\n\tb()\n}\n"
    );
}

#[test]
fn test_statements_in_case_clause() {
    let src = "package a

func f(x int) {
	switch x {
	case 1:
		a()
		b()
	}
}
";
    assert_snapshot!(rewrite("@@\n@@\n-a()\n-b()\n+c()\n", src), @r###"
package a

func f(x int) {
	switch x {
	case 1:
		c()
	}
}
"###);
}

#[test]
fn test_metavariable_must_agree() {
    let patch = "@@\nvar x expression\n@@\n-x == x\n+true\n";
    let src = "package a\n\nvar (\n\tp = a == a\n\tq = a == b\n)\n";
    assert_snapshot!(rewrite(patch, src), @r###"
package a

var (
	p = true
	q = a == b
)
"###);
}

#[test]
fn test_identifier_metavariable() {
    let patch = "@@\nvar f identifier\n@@\n-f.Close()\n+f.Shutdown()\n";
    let src = "package a\n\nfunc g() {\n\tconn.Close()\n\tdefer srv.Close()\n}\n";
    assert_eq!(
        rewrite(patch, src),
        "package a\n\nfunc g() {\n\tconn.Shutdown()\n\tdefer srv.Shutdown()\n}\n"
    );
}

#[test]
fn test_rename_function_keeps_doc() {
    let patch = "@@\n@@\n-func Old(...) {\n+func New(...) {\n \t...\n }\n";
    let src = "package a\n\n// Old does things.\nfunc Old(x int) {\n\tprintln(x)\n}\n";
    assert_snapshot!(rewrite(patch, src), @r###"
package a

// Old does things.
func New(x int) {
	println(x)
}
"###);
}

#[test]
fn test_programs_run_in_order() {
    let patch = "@@\n@@\n-foo\n+bar\n\n@ second @\n@@\n-bar()\n+baz()\n";
    let out = rewrite(patch, "package a; func b(){ foo() }");
    assert_snapshot!(out, @"package a; func b(){ baz() }");
}

#[test]
fn test_dots_across_lines_keep_layout() {
    let patch = "@@\n@@\n-foo(...)\n+bar(...)\n";
    let src = "package a\n\nfunc f() {\n\tfoo(1,\n\t\t2)\n}\n";
    assert_eq!(
        rewrite(patch, src),
        "package a\n\nfunc f() {\n\tbar(1,\n\t\t2)\n}\n"
    );
}

#[test]
fn test_comment_after_rewrite_is_kept() {
    let patch = "@@\n@@\n-a()\n+b()\n";
    let src = "package a\n\nfunc f() {\n\ta() // x\n\n\tc()\n}\n";
    assert_eq!(
        rewrite(patch, src),
        "package a\n\nfunc f() {\n\tb() // x\n\n\tc()\n}\n"
    );
}

#[test]
fn test_unassignable_match_is_skipped() {
    let patch = "@@\n@@\n-foo\n+a.bar\n";
    let out = rewrite(patch, "package a; func b(){ x.foo(); foo() }");
    assert_eq!(out, "package a; func b(){ x.foo(); a.bar() }");
}

#[test]
fn test_identical_replacement_keeps_source() {
    let patch = "@@\n@@\n-foo(a, b)\n+foo(a, b)\n";
    let src = "package a\n\nfunc f() {\n\tfoo(a,   b)\n\tfoo(a, b)\n}\n";
    assert_eq!(rewrite(patch, src), src);
}

#[test]
fn test_emptied_block_keeps_lines() {
    let src = "package a\n\nfunc f() {\n\tif c {\n\t\tx()\n\t}\n}\n";
    assert_eq!(
        rewrite("@@\n@@\n-x()\n", src),
        "package a\n\nfunc f() {\n\tif c {\n\t}\n}\n"
    );
}
