use crate::error::{AppError, AppResult};
use crate::patcher::common::{apply_splices, Splice};
use crate::patcher::imports::{ImportEntry, ImportLayout};
use ra_ap_edition::Edition;
use ra_ap_syntax::ast::{self, HasModuleItem, HasName};
use ra_ap_syntax::{AstNode, NodeOrToken, SourceFile, SyntaxKind, SyntaxNode, SyntaxToken};
use std::ops::Range;

/// Tag of a top-level type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// A `trait`: method signatures only.
    Interface,
    /// A `struct`: named data, methods live in `impl` blocks.
    Struct,
}

/// Offsets of a `{ ... }` item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Offset of `{`.
    pub open: usize,
    /// Offset of `}`.
    pub close: usize,
}

/// A top-level `trait` or `struct`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    /// Declaration tag.
    pub kind: TypeKind,
    /// Declared name.
    pub name: String,
    /// Span of the whole item.
    pub span: Range<usize>,
    /// Item list of a trait; `None` for structs.
    pub block: Option<Block>,
    /// Names of the associated functions of a trait.
    pub methods: Vec<String>,
}

/// A top-level `impl` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplDecl {
    /// Nominal name of the implementing type (`Foo` for `impl<T> a::Foo<T>`).
    pub self_ty: String,
    /// Nominal name of the implemented trait, for trait impls.
    pub trait_name: Option<String>,
    /// Span of the whole item.
    pub span: Range<usize>,
    /// The associated item list.
    pub block: Option<Block>,
    /// Names of the functions defined in the block.
    pub methods: Vec<String>,
}

impl TypeDecl {
    /// Whether the declaration already has a method with this name.
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m == name)
    }
}

impl ImplDecl {
    /// Whether the block already defines a function with this name.
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m == name)
    }
}

/// Tagged declaration model of one Rust source file.
///
/// Holds the imports, the module header, and the top-level traits, structs and
/// impl blocks, all as spans into the original text. Edits are recorded as
/// splices and only materialize in [`StructuralTree::serialize`].
#[derive(Debug, Clone)]
pub struct StructuralTree<'a> {
    source: &'a str,
    imports: Vec<ImportEntry>,
    header: Option<Range<usize>>,
    types: Vec<TypeDecl>,
    impls: Vec<ImplDecl>,
    splices: Vec<Splice>,
}

impl<'a> StructuralTree<'a> {
    /// Parses `source`, failing on any syntax error.
    pub fn parse(source: &'a str) -> AppResult<Self> {
        let parse = SourceFile::parse(source, Edition::Edition2021);
        if let Some(err) = parse.errors().first() {
            let offset: usize = err.range().start().into();
            return Err(AppError::Parse(format!("{} at offset {}", err, offset)));
        }
        let file = parse.tree();

        let mut tree = Self {
            source,
            imports: Vec::new(),
            header: module_header(&file),
            types: Vec::new(),
            impls: Vec::new(),
            splices: Vec::new(),
        };

        for item in file.items() {
            match item {
                ast::Item::Use(use_item) => tree.imports.extend(import_entries(&use_item)),
                ast::Item::Trait(trait_def) => {
                    let Some(name) = trait_def.name() else {
                        continue;
                    };
                    let list = trait_def.assoc_item_list();
                    tree.types.push(TypeDecl {
                        kind: TypeKind::Interface,
                        name: name.text().to_string(),
                        span: span_of(trait_def.syntax()),
                        block: list.as_ref().and_then(block_of),
                        methods: list.as_ref().map(fn_names).unwrap_or_default(),
                    });
                }
                ast::Item::Struct(struct_def) => {
                    let Some(name) = struct_def.name() else {
                        continue;
                    };
                    tree.types.push(TypeDecl {
                        kind: TypeKind::Struct,
                        name: name.text().to_string(),
                        span: span_of(struct_def.syntax()),
                        block: None,
                        methods: Vec::new(),
                    });
                }
                ast::Item::Impl(impl_def) => {
                    let Some(self_ty) = impl_def.self_ty() else {
                        continue;
                    };
                    let list = impl_def.assoc_item_list();
                    tree.impls.push(ImplDecl {
                        self_ty: nominal_name(&self_ty.syntax().text().to_string()),
                        trait_name: impl_def
                            .trait_()
                            .map(|t| nominal_name(&t.syntax().text().to_string())),
                        span: span_of(impl_def.syntax()),
                        block: list.as_ref().and_then(block_of),
                        methods: list.as_ref().map(fn_names).unwrap_or_default(),
                    });
                }
                _ => {}
            }
        }

        Ok(tree)
    }

    /// The text the tree was parsed from.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// The top-level trait with this exact name.
    pub fn interface(&self, name: &str) -> Option<&TypeDecl> {
        self.find_type(TypeKind::Interface, name)
    }

    /// The top-level struct with this exact name.
    pub fn record(&self, name: &str) -> Option<&TypeDecl> {
        self.find_type(TypeKind::Struct, name)
    }

    fn find_type(&self, kind: TypeKind, name: &str) -> Option<&TypeDecl> {
        self.types
            .iter()
            .find(|decl| decl.kind == kind && decl.name == name)
    }

    /// Impl blocks whose self type is `name`, in document order.
    pub fn impls_for<'t>(&'t self, name: &'t str) -> impl Iterator<Item = &'t ImplDecl> + 't {
        self.impls.iter().filter(move |imp| imp.self_ty == name)
    }

    /// Imports plus the module header as the anchor for a first import.
    pub fn import_layout(&self) -> ImportLayout {
        ImportLayout {
            entries: self.imports.clone(),
            package: self.header.clone(),
            version: None,
        }
    }

    /// Records an edit.
    pub fn push(&mut self, splice: Splice) {
        self.splices.push(splice);
    }

    /// Emits the source with every recorded edit applied.
    pub fn serialize(&self) -> String {
        apply_splices(self.source, &self.splices)
    }
}

fn span_of(node: &SyntaxNode) -> Range<usize> {
    let range = node.text_range();
    range.start().into()..range.end().into()
}

fn offset_of(token: &SyntaxToken) -> usize {
    token.text_range().start().into()
}

fn block_of(list: &ast::AssocItemList) -> Option<Block> {
    Some(Block {
        open: offset_of(&list.l_curly_token()?),
        close: offset_of(&list.r_curly_token()?),
    })
}

fn fn_names(list: &ast::AssocItemList) -> Vec<String> {
    list.assoc_items()
        .filter_map(|item| match item {
            ast::AssocItem::Fn(func) => func.name().map(|n| n.text().to_string()),
            _ => None,
        })
        .collect()
}

/// `a::Foo<T>` -> `Foo`.
fn nominal_name(ty: &str) -> String {
    let base = ty.split('<').next().unwrap_or(ty);
    base.rsplit("::").next().unwrap_or(base).trim().to_string()
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn import_entries(use_item: &ast::Use) -> Vec<ImportEntry> {
    let span = span_of(use_item.syntax());
    let mut pairs = Vec::new();
    if let Some(tree) = use_item.use_tree() {
        flatten_use_tree(&tree, "", &mut pairs);
    }
    pairs
        .into_iter()
        .map(|(path, alias)| ImportEntry {
            span: span.clone(),
            path,
            alias,
        })
        .collect()
}

/// Expands `a::{b, c as d, e::*}` into `(a::b, None)`, `(a::c, Some(d))`, `(a::e::*, None)`.
fn flatten_use_tree(tree: &ast::UseTree, prefix: &str, out: &mut Vec<(String, Option<String>)>) {
    let own = tree.path().map(|p| compact(&p.syntax().text().to_string()));
    let path = match own.as_deref() {
        None | Some("self") => prefix.to_string(),
        Some(own) if prefix.is_empty() => own.to_string(),
        Some(own) => format!("{}::{}", prefix, own),
    };

    if let Some(list) = tree.use_tree_list() {
        for child in list.use_trees() {
            flatten_use_tree(&child, &path, out);
        }
    } else if tree.star_token().is_some() {
        let glob = if path.is_empty() {
            "*".to_string()
        } else {
            format!("{}::*", path)
        };
        out.push((glob, None));
    } else {
        let alias = tree.rename().map(|rename| {
            let text = rename.syntax().text().to_string();
            let text = text.trim();
            text.strip_prefix("as").unwrap_or(text).trim().to_string()
        });
        out.push((path, alias));
    }
}

/// Span of the last inner doc comment (`//!`, `/*!`) or inner attribute
/// before the first item.
///
/// Plain comments ahead of it (license banners) are part of the header.
fn module_header(file: &SourceFile) -> Option<Range<usize>> {
    let mut header = None;

    for element in file.syntax().children_with_tokens() {
        match element {
            NodeOrToken::Token(token) => {
                let text = token.text();
                if token.kind() == SyntaxKind::COMMENT
                    && (text.starts_with("//!") || text.starts_with("/*!"))
                {
                    let start = offset_of(&token);
                    header = Some(start..start + text.len());
                }
            }
            NodeOrToken::Node(node) => match ast::Attr::cast(node.clone()) {
                Some(attr) if attr.excl_token().is_some() => header = Some(span_of(&node)),
                _ => break,
            },
        }
    }

    header
}
