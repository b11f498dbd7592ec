use super::common::rewrite;
use insta::assert_snapshot;

const SWAP: &str = "@@
@@
-import \"fmt\"
+import \"log\"

-fmt.Println(...)
+log.Println(...)
";

#[test]
fn test_replace_package() {
    let src = "package a\n\nimport \"fmt\"\n\nfunc f() {\n\tfmt.Println(\"hi\", 1)\n}\n";
    assert_snapshot!(rewrite(SWAP, src), @r###"
package a

import "log"

func f() {
	log.Println("hi", 1)
}
"###);
}

#[test]
fn test_keep_import_in_use() {
    let src = "package a\n\nimport \"fmt\"\n\nfunc f() {\n\tfmt.Println(\"hi\")\n\tfmt.Sprint(1)\n}\n";
    assert_snapshot!(rewrite(SWAP, src), @r###"
package a

import (
	"fmt"
	"log"
)

func f() {
	log.Println("hi")
	fmt.Sprint(1)
}
"###);
}

#[test]
fn test_missing_import_does_not_match() {
    let src = "package a\n\nfunc f() {\n\tfmt.Println(\"hi\")\n}\n";
    assert_eq!(rewrite(SWAP, src), src);
}

#[test]
fn test_imports_only() {
    let patch = "@@\n@@\n-import \"io/ioutil\"\n+import \"os\"\n";
    let src = "package a\n\nimport \"io/ioutil\"\n\nvar _ = 1\n";
    assert_eq!(
        rewrite(patch, src),
        "package a\n\nimport \"os\"\n\nvar _ = 1\n"
    );
}

#[test]
fn test_rename_package() {
    let patch = "@@\n@@\n-package a\n+package b\n";
    assert_eq!(
        rewrite(patch, "package a\n\nfunc f() {}\n"),
        "package b\n\nfunc f() {}\n"
    );
    assert_eq!(
        rewrite(patch, "package c\n\nfunc f() {}\n"),
        "package c\n\nfunc f() {}\n"
    );
}
