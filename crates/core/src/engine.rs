/*!
Driving compiled patches over a file.

A `Program` is one compiled patch. `apply` walks a file bottom-up, so
rewrites of inner code are in place before enclosing code is tried,
and substitutes every successful replacement into the tree. Statement
and declaration patterns match a window of a block, case clause or file
and rebuild that container around the replaced window.

After at least one rewrite the program updates the file's imports and
package clause to what the patch asks for.
*/
use crate::binding::{Binding, Bindings, Capture, Chain, Frozen, Key};
use crate::changelog::{Changelog, IntervalSet};
use crate::error::{RewriteError, RewriteErrorKind};
use crate::matcher::Matcher;
use crate::replacer::{ReplaceCx, Replacer};
use crate::snapshot::Snapshot;
use crate::syntax::{Class, FieldType, Kind, Node, Pos, Region, SourceFile, Tok, Value};
use std::rc::Rc;
use tracing::{debug, trace};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Level {
    Stmts,
    Decls,
}

#[derive(Debug)]
pub(crate) enum Body {
    /// only imports or the package clause are patched
    None,
    Expr { matcher: Matcher, replacer: Replacer },
    /// a window of statements or declarations
    List {
        level: Level,
        matcher: Matcher,
        replacer: Replacer,
    },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) enum Alias {
    /// no alias: the package is used by its own name
    Default,
    Name(String),
    /// alias bound to a metavariable
    Meta(String),
}

#[derive(Clone, Debug)]
pub(crate) struct ImportRule {
    pub path: String,
    pub alias: Alias,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ImportPlan {
    pub pattern: Vec<ImportRule>,
    pub template: Vec<ImportRule>,
}

#[derive(Clone, Debug)]
pub(crate) struct PackageRule {
    pub pattern: String,
    pub template: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ApplyOption {
    /// add, rename and remove imports as the patch says
    pub fix_imports: bool,
    /// let `Session` diff tree snapshots between programs
    pub diff_snapshots: bool,
}

impl Default for ApplyOption {
    fn default() -> Self {
        Self {
            fix_imports: true,
            diff_snapshots: true,
        }
    }
}

/// A compiled patch.
#[derive(Debug)]
pub struct Program {
    pub name: Option<String>,
    pub(crate) body: Body,
    pub(crate) imports: ImportPlan,
    pub(crate) package: Option<PackageRule>,
}

struct Pass<'a> {
    base: &'a Chain,
    log: &'a mut Changelog,
    count: usize,
    /// bindings of the latest rewrite
    last: Option<Frozen>,
}

impl Program {
    pub fn level(&self) -> Option<Level> {
        match &self.body {
            Body::List { level, .. } => Some(*level),
            _ => None,
        }
    }

    /// Match one candidate: an expression for expression patterns, a
    /// block, case clause or file for statement and declaration patterns.
    pub fn match_node(&self, candidate: &Value) -> Option<Chain> {
        let base = Chain::new();
        match &self.body {
            Body::None => None,
            Body::Expr { matcher, .. } => {
                let chain = matcher.matches(candidate, &base)?;
                Some(chain.extend(Key::Capture(Capture::Site), Binding::Region(candidate.region())))
            }
            Body::List { level, matcher, .. } => {
                let node = candidate.as_node()?;
                let field = container_field(*level, node.kind)?;
                match_window(node, field, 0, matcher, &base)
            }
        }
    }

    /// First match in `file` in pre-order, with the bindings of the
    /// file's imports.
    pub fn match_file(&self, file: &Node) -> Option<Chain> {
        let base = self.match_header(file)?;
        match &self.body {
            Body::None => Some(base),
            Body::Expr { matcher, .. } => first_in_fields(file, &mut |value: &Value| {
                let chain = matcher.matches(value, &base)?;
                Some(chain.extend(Key::Capture(Capture::Site), Binding::Region(value.region())))
            }),
            Body::List { level, matcher, .. } => {
                let mut found = None;
                file.walk(&mut |n: &Node| {
                    if found.is_some() {
                        return;
                    }
                    if let Some(field) = container_field(*level, n.kind) {
                        found = match_window(n, field, 0, matcher, &base);
                    }
                });
                found
            }
        }
    }

    /// Build the replacement of one match. Pending changelog marks are
    /// committed on success and dropped on error.
    pub fn replace(&self, bindings: &dyn Bindings, log: &mut Changelog) -> Result<Value, RewriteError> {
        self.replace_into(bindings, log, None, None)
            .map(|value| value.unwrap_or(Value::Nil))
    }

    /// `replace` without change tracking.
    pub fn replace_value(&self, bindings: &dyn Bindings) -> Result<Value, RewriteError> {
        self.replace(bindings, &mut Changelog::new())
    }

    fn replace_into(
        &self,
        bindings: &dyn Bindings,
        log: &mut Changelog,
        slot: Option<FieldType>,
        old: Option<&Node>,
    ) -> Result<Option<Value>, RewriteError> {
        let site = bindings
            .region(&Key::Capture(Capture::Site))
            .unwrap_or_default();
        log.changed(site);
        let result = {
            let mut cx = ReplaceCx::new(bindings, log, site.start);
            self.build(&mut cx)
        };
        let result = result.and_then(|value| match slot {
            Some(slot) if !slot.accepts(&value) => Err(RewriteError::unassignable(format!(
                "{:?} does not fit where {:?} was",
                value.kind(),
                bindings
                    .region(&Key::Capture(Capture::Site))
                    .map(|r| r.start)
                    .unwrap_or(Pos::NONE)
            ))),
            _ => Ok(value),
        });
        let identical = |value: &Value| match (old, value.as_node()) {
            (Some(old), Some(new)) => new.same_code(old),
            _ => false,
        };
        match result {
            Ok(value) if identical(&value) => {
                // same code as the match: leave the source as it is
                log.discard();
                Ok(None)
            }
            Ok(value) => {
                log.commit();
                Ok(Some(value))
            }
            Err(e) => {
                log.discard();
                Err(e)
            }
        }
    }

    fn build(&self, cx: &mut ReplaceCx) -> Result<Value, RewriteError> {
        match &self.body {
            Body::None => Ok(Value::Nil),
            Body::Expr { replacer, .. } => replacer.replace(cx),
            Body::List {
                level, replacer, ..
            } => {
                let bindings = cx.bindings;
                let mut node = bindings
                    .captured(&Key::Capture(Capture::Container))
                    .and_then(|(v, _)| v.as_node())
                    .cloned()
                    .ok_or_else(|| RewriteError::missing("the enclosing block", Pos::NONE))?;
                let field = container_field(*level, node.kind)
                    .ok_or_else(|| RewriteError::missing("the enclosing block", Pos::NONE))?;
                let items = match replacer.replace(cx)? {
                    Value::List(items) => items,
                    other => vec![other],
                };
                let slot = node.kind.index_of(field).map(|i| node.kind.fields()[i].ty);
                if let Some(Value::List(list)) = node.get_mut(field) {
                    list.extend(items);
                }
                if let Some(slot) = slot {
                    if !slot.accepts(node.get(field)) {
                        return Err(RewriteError::unassignable(format!(
                            "replacement does not fit in {:?}",
                            node.kind
                        )));
                    }
                }
                Ok(Value::node(node))
            }
        }
    }

    /// Rewrite every match in `file`. Returns the number of rewrites.
    pub fn apply(&self, file: &mut Node, log: &mut Changelog) -> Result<usize, RewriteError> {
        self.apply_with(file, log, &ApplyOption::default())
    }

    pub fn apply_with(
        &self,
        file: &mut Node,
        log: &mut Changelog,
        option: &ApplyOption,
    ) -> Result<usize, RewriteError> {
        let base = match self.match_header(file) {
            Some(chain) => chain,
            None => {
                debug!("{}: imports or package do not match", self.display_name());
                return Ok(0);
            }
        };
        let mut pass = Pass {
            base: &base,
            log: &mut *log,
            count: 0,
            last: None,
        };
        match &self.body {
            Body::None => {}
            Body::Expr { .. } => {
                for (def, field) in Kind::File.fields().iter().zip(file.fields.iter_mut()) {
                    if descends(def.ty) {
                        self.rewrite_exprs(field, def.ty, &mut pass)?;
                    }
                }
            }
            Body::List { level, matcher, .. } => {
                self.rewrite_lists(file, *level, matcher, &mut pass)?;
            }
        }
        let mut count = pass.count;
        let bindings = pass.last.take().unwrap_or_else(|| base.freeze());
        if count > 0 || matches!(self.body, Body::None) {
            let mut touched = false;
            if option.fix_imports {
                touched |= self.fix_imports(file, &bindings, log);
            }
            touched |= self.rename_package(file, log);
            log.commit();
            if matches!(self.body, Body::None) && touched {
                count = 1;
            }
        }
        debug!("{}: {} rewrites", self.display_name(), count);
        Ok(count)
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("patch")
    }

    fn rewrite_exprs(&self, value: &mut Value, slot: FieldType, pass: &mut Pass) -> Result<(), RewriteError> {
        match value {
            Value::List(items) => {
                let item_slot = match slot {
                    FieldType::List(class) => FieldType::Node(class),
                    other => other,
                };
                for item in items.iter_mut() {
                    self.rewrite_exprs(item, item_slot, pass)?;
                }
                return Ok(());
            }
            Value::Node(node) => {
                if is_import_decl(node) {
                    return Ok(());
                }
                let kind = node.kind;
                for (def, field) in kind.fields().iter().zip(node.fields.iter_mut()) {
                    if descends(def.ty) {
                        self.rewrite_exprs(field, def.ty, pass)?;
                    }
                }
            }
            _ => return Ok(()),
        }
        let matcher = match &self.body {
            Body::Expr { matcher, .. } => matcher,
            _ => return Ok(()),
        };
        let chain = match matcher.matches(value, pass.base) {
            Some(chain) => chain,
            None => return Ok(()),
        };
        let site = value.region();
        trace!("match at {:?}", site);
        let bindings = chain
            .extend(Key::Capture(Capture::Site), Binding::Region(site))
            .freeze();
        match self.replace_into(&bindings, pass.log, Some(slot), value.as_node()) {
            Ok(Some(new)) => {
                *value = new;
                pass.count += 1;
                pass.last = Some(bindings);
                Ok(())
            }
            Ok(None) => {
                trace!("replacement at {:?} is identical", site);
                pass.count += 1;
                pass.last = Some(bindings);
                Ok(())
            }
            Err(e) if e.kind == RewriteErrorKind::Unassignable => {
                debug!("skipping match at {:?}: {}", site, e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn rewrite_lists(
        &self,
        node: &mut Node,
        level: Level,
        matcher: &Matcher,
        pass: &mut Pass,
    ) -> Result<(), RewriteError> {
        if is_import_decl(node) {
            return Ok(());
        }
        let kind = node.kind;
        for (def, field) in kind.fields().iter().zip(node.fields.iter_mut()) {
            if !descends(def.ty) {
                continue;
            }
            match field {
                Value::Node(child) => self.rewrite_lists(child, level, matcher, pass)?,
                Value::List(items) => {
                    for item in items.iter_mut() {
                        if let Value::Node(child) = item {
                            self.rewrite_lists(child, level, matcher, pass)?;
                        }
                    }
                }
                _ => {}
            }
        }
        if let Some(field) = container_field(level, node.kind) {
            self.rewrite_container(node, field, matcher, pass)?;
        }
        Ok(())
    }

    fn rewrite_container(
        &self,
        node: &mut Node,
        field: &str,
        matcher: &Matcher,
        pass: &mut Pass,
    ) -> Result<(), RewriteError> {
        let mut offset = 0;
        loop {
            let len = node.list(field).len();
            if offset >= len {
                break;
            }
            let chain = match match_window(node, field, offset, matcher, pass.base) {
                Some(chain) => chain,
                None => break,
            };
            let bindings = chain.freeze();
            let run_len = |capture| {
                bindings
                    .run(&Key::Capture(capture))
                    .map_or(0, |(items, _)| items.len())
            };
            let (head, tail) = (run_len(Capture::Head), run_len(Capture::Tail));
            match self.replace_into(&bindings, pass.log, None, Some(&*node)) {
                Ok(Some(Value::Node(new))) => {
                    *node = *new;
                    pass.count += 1;
                    pass.last = Some(bindings);
                    let new_len = node.list(field).len();
                    let next = new_len.saturating_sub(tail);
                    if next <= offset && new_len >= len {
                        break;
                    }
                    offset = next;
                }
                Ok(None) => {
                    trace!("replacement in {:?} is identical", node.kind);
                    pass.count += 1;
                    pass.last = Some(bindings);
                    offset = len.saturating_sub(tail).max(offset + head + 1);
                }
                Ok(Some(_)) => break,
                Err(e) if e.kind == RewriteErrorKind::Unassignable => {
                    debug!("skipping match in {:?}: {}", node.kind, e);
                    offset += head + 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    // package and imports

    /// Bindings every match starts from: the package name and the
    /// imports the pattern lists must be present.
    fn match_header(&self, file: &Node) -> Option<Chain> {
        if let Some(rule) = &self.package {
            let name = file.node("Name").and_then(Node::name)?;
            if name != rule.pattern {
                return None;
            }
        }
        let imports = file_imports(file);
        let mut chain = Chain::new();
        for rule in &self.imports.pattern {
            let found = imports.iter().find(|i| i.path == rule.path)?;
            let resolved = found.name.clone().unwrap_or_else(|| guess_name(&rule.path));
            match &rule.alias {
                Alias::Default => {
                    if resolved != guess_name(&rule.path) {
                        return None;
                    }
                }
                Alias::Name(name) => {
                    if resolved != *name {
                        return None;
                    }
                }
                Alias::Meta(meta) => {
                    let ident = Value::ident(found.name_pos, resolved.clone());
                    match chain.meta(meta) {
                        Some((value, _, _)) => {
                            if value.as_node().and_then(Node::name) != Some(resolved.as_str()) {
                                return None;
                            }
                        }
                        None => {
                            let region = ident.region();
                            chain = chain.extend(
                                Key::Meta(meta.clone()),
                                Binding::Meta {
                                    matcher: Rc::new(Matcher::literal(&ident)),
                                    value: ident,
                                    region,
                                },
                            );
                        }
                    }
                }
            }
            chain = chain.extend(
                Key::Import(rule.path.clone()),
                Binding::Import { name: resolved },
            );
        }
        Some(chain)
    }

    fn fix_imports(&self, file: &mut Node, bindings: &dyn Bindings, log: &mut Changelog) -> bool {
        let plan = &self.imports;
        if plan.pattern.is_empty() && plan.template.is_empty() {
            return false;
        }
        let wanted: Vec<(String, Option<String>)> = plan
            .template
            .iter()
            .map(|rule| {
                let alias = match &rule.alias {
                    Alias::Default => None,
                    Alias::Name(name) => Some(name.clone()),
                    Alias::Meta(meta) => bindings
                        .meta(meta)
                        .and_then(|(v, _, _)| v.as_node().and_then(Node::name))
                        .map(String::from),
                };
                (rule.path.clone(), alias)
            })
            .collect();
        let present = file_imports(file);
        let incoming: Vec<String> = wanted
            .iter()
            .filter(|(path, _)| !present.iter().any(|i| &i.path == path))
            .map(|(path, alias)| alias.clone().unwrap_or_else(|| guess_name(path)))
            .collect();
        let mut touched = false;

        for rule in &plan.pattern {
            if wanted.iter().any(|(path, _)| *path == rule.path) {
                continue;
            }
            let name = bindings
                .import(&rule.path)
                .map(String::from)
                .unwrap_or_else(|| guess_name(&rule.path));
            let taken_over = incoming.contains(&name);
            if !taken_over && name != "_" && name != "." && uses_name(file, &name) {
                debug!("keeping import {:?}: {} is still used", rule.path, name);
                continue;
            }
            debug!("removing import {:?}", rule.path);
            touched |= remove_import(file, &rule.path, log);
        }

        for (path, alias) in &wanted {
            let in_pattern = plan.pattern.iter().any(|r| r.path == *path);
            if in_pattern {
                touched |= rename_import(file, path, alias.as_deref(), log);
            } else if !file_imports(file).iter().any(|i| i.path == *path) {
                debug!("adding import {:?}", path);
                add_import(file, path, alias.as_deref(), log);
                touched = true;
            }
        }
        touched
    }

    fn rename_package(&self, file: &mut Node, log: &mut Changelog) -> bool {
        let to = match self.package.as_ref().and_then(|r| r.template.as_ref()) {
            Some(to) => to,
            None => return false,
        };
        let old = match file.node("Name") {
            Some(old) => old,
            None => return false,
        };
        if old.name() == Some(to.as_str()) {
            return false;
        }
        let (pos, region) = (old.pos(), old.region());
        file.set("Name", Value::ident(pos, to.clone()));
        log.changed(region);
        true
    }
}

/// the list field of a container kind at this level
pub(crate) fn container_field(level: Level, kind: Kind) -> Option<&'static str> {
    match (level, kind) {
        (Level::Stmts, Kind::BlockStmt) => Some("List"),
        (Level::Stmts, Kind::CaseClause) => Some("Body"),
        (Level::Decls, Kind::File) => Some("Decls"),
        _ => None,
    }
}

/// Match the window `list[offset..]` of a container.
fn match_window(node: &Node, field: &str, offset: usize, matcher: &Matcher, base: &Chain) -> Option<Chain> {
    let items = node.list(field).get(offset..)?;
    let chain = matcher.matches_items(items, base)?;
    let index = node.kind.index_of(field)?;
    let fields = node
        .fields
        .iter()
        .enumerate()
        .map(|(i, v)| {
            if i == index {
                Value::List(node.list(field)[..offset].to_vec())
            } else {
                v.clone()
            }
        })
        .collect();
    let container = Value::node(Node::new(node.kind, fields));
    let site = match (items.first(), items.last()) {
        (Some(first), Some(last)) => Region::new(first.pos(), last.end()),
        _ => Region::default(),
    };
    Some(
        chain
            .extend(
                Key::Capture(Capture::Container),
                Binding::Captured {
                    value: container,
                    region: node.region(),
                },
            )
            .extend(Key::Capture(Capture::Site), Binding::Region(site)),
    )
}

/// Pre-order search over the code below `node`.
fn first_in_fields(node: &Node, f: &mut dyn FnMut(&Value) -> Option<Chain>) -> Option<Chain> {
    if is_import_decl(node) {
        return None;
    }
    node.kind
        .fields()
        .iter()
        .zip(node.fields.iter())
        .filter(|(def, _)| descends(def.ty))
        .find_map(|(_, value)| first_in(value, f))
}

fn first_in(value: &Value, f: &mut dyn FnMut(&Value) -> Option<Chain>) -> Option<Chain> {
    match value {
        Value::Node(n) => f(value).or_else(|| first_in_fields(n, f)),
        Value::List(items) => items.iter().find_map(|item| first_in(item, f)),
        _ => None,
    }
}

/// Fields the rewriting walks descend into. Comments are never code.
fn descends(ty: FieldType) -> bool {
    match ty {
        FieldType::Node(class) | FieldType::List(class) => !class.intersects(Class::COMMENT_GROUP),
        _ => false,
    }
}

fn is_import_decl(node: &Node) -> bool {
    node.kind == Kind::GenDecl && node.tok("Tok") == Some(Tok::Import)
}

struct FileImport {
    decl: usize,
    spec: usize,
    path: String,
    name: Option<String>,
    name_pos: Pos,
    region: Region,
}

fn file_imports(file: &Node) -> Vec<FileImport> {
    let mut imports = vec![];
    for (d, decl) in file.list("Decls").iter().enumerate() {
        let decl = match decl.as_node() {
            Some(n) if is_import_decl(n) => n,
            _ => continue,
        };
        for (s, spec) in decl.list("Specs").iter().enumerate() {
            let spec = match spec.as_node() {
                Some(spec) => spec,
                None => continue,
            };
            let path = match import_path(spec) {
                Some(path) => path,
                None => continue,
            };
            let name = spec.node("Name");
            imports.push(FileImport {
                decl: d,
                spec: s,
                path,
                name: name.and_then(Node::name).map(String::from),
                name_pos: name.map_or(Pos::NONE, Node::pos),
                region: spec.region(),
            });
        }
    }
    imports
}

pub(crate) fn import_path(spec: &Node) -> Option<String> {
    let lit = spec.node("Path")?;
    unquote(lit.str("Value")?)
}

pub(crate) fn unquote(lit: &str) -> Option<String> {
    let inner = lit
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| lit.strip_prefix('`').and_then(|s| s.strip_suffix('`')))?;
    Some(inner.to_string())
}

fn is_major_version(s: &str) -> bool {
    s.len() > 1 && s.starts_with('v') && s[1..].bytes().all(|b| b.is_ascii_digit())
}

/// Package name an import path is expected to declare.
pub fn guess_name(path: &str) -> String {
    let mut parts = path.rsplit('/');
    let mut last = parts.next().unwrap_or(path);
    if is_major_version(last) {
        if let Some(prev) = parts.next() {
            last = prev;
        }
    }
    if let Some((base, version)) = last.rsplit_once('.') {
        if is_major_version(version) {
            last = base;
        }
    }
    let last = last.strip_prefix("go-").unwrap_or(last);
    let last = last
        .strip_suffix(".go")
        .or_else(|| last.strip_suffix("-go"))
        .unwrap_or(last);
    last.replace(|c: char| c == '-' || c == '.', "_")
}

/// whether any selector expression uses `name` as its prefix
fn uses_name(file: &Node, name: &str) -> bool {
    let mut used = false;
    file.walk(&mut |n: &Node| {
        if n.kind == Kind::SelectorExpr && n.node("X").and_then(Node::name) == Some(name) {
            used = true;
        }
    });
    used
}

fn decls_mut(file: &mut Node) -> Option<&mut Vec<Value>> {
    match file.get_mut("Decls")? {
        Value::List(decls) => Some(decls),
        _ => None,
    }
}

fn specs_mut(decl: &mut Value) -> Option<&mut Vec<Value>> {
    match decl.as_node_mut()?.get_mut("Specs")? {
        Value::List(specs) => Some(specs),
        _ => None,
    }
}

fn remove_import(file: &mut Node, path: &str, log: &mut Changelog) -> bool {
    let target = match file_imports(file).into_iter().find(|i| i.path == path) {
        Some(target) => target,
        None => return false,
    };
    let decls = match decls_mut(file) {
        Some(decls) => decls,
        None => return false,
    };
    let decl_region = decls[target.decl].region();
    let emptied = match specs_mut(&mut decls[target.decl]) {
        Some(specs) => {
            specs.remove(target.spec);
            specs.is_empty()
        }
        None => return false,
    };
    log.changed(target.region);
    if emptied {
        decls.remove(target.decl);
        log.changed(decl_region);
    }
    true
}

fn rename_import(file: &mut Node, path: &str, alias: Option<&str>, log: &mut Changelog) -> bool {
    let target = match file_imports(file).into_iter().find(|i| i.path == path) {
        Some(target) => target,
        None => return false,
    };
    if target.name.as_deref() == alias {
        return false;
    }
    let spec = decls_mut(file)
        .and_then(|decls| specs_mut(&mut decls[target.decl]))
        .and_then(|specs| specs.get_mut(target.spec))
        .and_then(Value::as_node_mut);
    match spec {
        Some(spec) => {
            let name = alias.map_or(Value::Nil, |a| Value::ident(Pos::NONE, a));
            spec.set("Name", name);
            log.changed(target.region);
            true
        }
        None => false,
    }
}

fn import_spec(path: &str, alias: Option<&str>) -> Value {
    let lit = Node::new(
        Kind::BasicLit,
        vec![
            Value::Pos(Pos::NONE),
            Value::Tok(Tok::String),
            Value::Str(format!("{:?}", path)),
        ],
    );
    Value::node(Node::new(
        Kind::ImportSpec,
        vec![
            Value::Nil,
            alias.map_or(Value::Nil, |a| Value::ident(Pos::NONE, a)),
            Value::node(lit),
        ],
    ))
}

fn add_import(file: &mut Node, path: &str, alias: Option<&str>, log: &mut Changelog) {
    let spec = import_spec(path, alias);
    let anchor = file.node("Name").map_or(Pos::NONE, Node::end);
    let decls = match decls_mut(file) {
        Some(decls) => decls,
        None => return,
    };
    let group = decls
        .iter()
        .position(|d| d.as_node().map_or(false, is_import_decl));
    match group {
        Some(index) => {
            let region = decls[index].region();
            if let Some(specs) = specs_mut(&mut decls[index]) {
                let at = specs
                    .iter()
                    .position(|s| {
                        s.as_node()
                            .and_then(import_path)
                            .map_or(false, |p| p.as_str() > path)
                    })
                    .unwrap_or(specs.len());
                specs.insert(at, spec);
            }
            log.changed(region);
        }
        None => {
            let first = decls.first().map_or(Pos::NONE, Value::pos);
            let decl = Node::new(
                Kind::GenDecl,
                vec![
                    Value::Nil,
                    Value::Pos(Pos::NONE),
                    Value::Tok(Tok::Import),
                    Value::Pos(Pos::NONE),
                    Value::List(vec![spec]),
                    Value::Pos(Pos::NONE),
                ],
            );
            decls.insert(0, Value::node(decl));
            log.changed(Region::new(anchor, first));
        }
    }
}

/// Applies programs one after another to the same file.
pub struct Session<'a> {
    source: &'a SourceFile,
    option: ApplyOption,
}

impl<'a> Session<'a> {
    pub fn new(source: &'a SourceFile) -> Self {
        Self {
            source,
            option: ApplyOption::default(),
        }
    }

    pub fn with_option(mut self, option: ApplyOption) -> Self {
        self.option = option;
        self
    }

    /// Run every program over `file` in order and return the source
    /// ranges they changed. Each program sees the previous one's output;
    /// a snapshot diff between passes catches changes the replacements
    /// did not report themselves.
    pub fn apply(&self, programs: &[Program], file: &mut Node) -> Result<IntervalSet, RewriteError> {
        let mut snapshot = if self.option.diff_snapshots {
            Some(Snapshot::capture(file, &self.source.lines))
        } else {
            None
        };
        let mut changed = IntervalSet::new();
        for program in programs {
            let mut log = Changelog::new();
            let count = program.apply_with(file, &mut log, &self.option)?;
            changed.union(log.result());
            if let Some(before) = snapshot.take() {
                let mut diff = Changelog::new();
                let after = before.diff_against(file, &mut diff);
                // code a replacement copied from its match stays verbatim
                // even where the node around it moved
                let mut moved = diff.into_result();
                moved.subtract(log.kept());
                trace!("snapshot diff: {:?}", moved);
                changed.union(&moved);
                snapshot = Some(after);
            }
            debug!("{}: {} rewrites", program.display_name(), count);
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_guess_name() {
        assert_eq!(guess_name("fmt"), "fmt");
        assert_eq!(guess_name("net/http"), "http");
        assert_eq!(guess_name("github.com/pkg/errors"), "errors");
        assert_eq!(guess_name("github.com/go-yaml/yaml/v3"), "yaml");
        assert_eq!(guess_name("gopkg.in/yaml.v2"), "yaml");
        assert_eq!(guess_name("github.com/mattn/go-sqlite3"), "sqlite3");
        assert_eq!(guess_name("github.com/foo/bar-go"), "bar");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"fmt\"").as_deref(), Some("fmt"));
        assert_eq!(unquote("`os`").as_deref(), Some("os"));
        assert_eq!(unquote("fmt"), None);
    }

    #[test]
    fn test_container_fields() {
        assert_eq!(container_field(Level::Stmts, Kind::BlockStmt), Some("List"));
        assert_eq!(container_field(Level::Stmts, Kind::CaseClause), Some("Body"));
        assert_eq!(container_field(Level::Stmts, Kind::File), None);
        assert_eq!(container_field(Level::Decls, Kind::File), Some("Decls"));
    }
}
