//! Parser for the module language.
//!
//! A module file is a sequence of lines:
//!
//! ```text
//! # comment
//! use other_module
//! name: type_name
//! name = other_module.other_name
//! ```
//!
//! Parsing is total: malformed lines and duplicate exports become
//! [`ParseFault`]s inside the summary, never failures, so the producer
//! contract of the exports layer holds for arbitrary input.

use strata_common::Interner;

use crate::summary::{ExportDecl, ModuleSummary};

/// One recoverable problem found while parsing a module.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParseFault {
    /// 1-based line number.
    pub line: usize,
    /// What was wrong with it.
    pub message: String,
}

/// Parses module source text into a summary.
pub fn parse_module(source: &str, interner: &Interner) -> ModuleSummary {
    let mut summary = ModuleSummary::default();

    for (index, raw_line) in source.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(target) = line.strip_prefix("use ") {
            let target = target.trim();
            if is_name(target) {
                summary.imports.insert(interner.intern(target));
            } else {
                summary.faults.push(ParseFault {
                    line: line_no,
                    message: format!("invalid module name `{target}`"),
                });
            }
            continue;
        }

        if let Some((name, target)) = split_decl(line, '=') {
            parse_alias(name, target, line_no, interner, &mut summary);
            continue;
        }

        if let Some((name, type_name)) = split_decl(line, ':') {
            parse_declared(name, type_name, line_no, interner, &mut summary);
            continue;
        }

        summary.faults.push(ParseFault {
            line: line_no,
            message: format!("unrecognized declaration `{line}`"),
        });
    }

    summary
}

/// Splits `name <sep> rest`, trimming both sides. Returns `None` when the
/// separator is absent.
fn split_decl(line: &str, sep: char) -> Option<(&str, &str)> {
    let (name, rest) = line.split_once(sep)?;
    Some((name.trim(), rest.trim()))
}

fn parse_alias(
    name: &str,
    target: &str,
    line_no: usize,
    interner: &Interner,
    summary: &mut ModuleSummary,
) {
    if !is_name(name) {
        summary.faults.push(ParseFault {
            line: line_no,
            message: format!("invalid export name `{name}`"),
        });
        return;
    }
    let Some((module, export)) = target.split_once('.') else {
        summary.faults.push(ParseFault {
            line: line_no,
            message: format!("alias target `{target}` must be `module.name`"),
        });
        return;
    };
    if !is_name(module) || !is_name(export) {
        summary.faults.push(ParseFault {
            line: line_no,
            message: format!("alias target `{target}` must be `module.name`"),
        });
        return;
    }
    insert_export(
        name,
        ExportDecl::Alias {
            module: interner.intern(module),
            name: interner.intern(export),
        },
        line_no,
        interner,
        summary,
    );
}

fn parse_declared(
    name: &str,
    type_name: &str,
    line_no: usize,
    interner: &Interner,
    summary: &mut ModuleSummary,
) {
    if !is_name(name) {
        summary.faults.push(ParseFault {
            line: line_no,
            message: format!("invalid export name `{name}`"),
        });
        return;
    }
    if !is_name(type_name) {
        summary.faults.push(ParseFault {
            line: line_no,
            message: format!("invalid type name `{type_name}`"),
        });
        return;
    }
    insert_export(
        name,
        ExportDecl::Declared(interner.intern(type_name)),
        line_no,
        interner,
        summary,
    );
}

/// Records an export, keeping the first declaration on a duplicate.
fn insert_export(
    name: &str,
    decl: ExportDecl,
    line_no: usize,
    interner: &Interner,
    summary: &mut ModuleSummary,
) {
    let ident = interner.intern(name);
    if summary.exports.contains_key(&ident) {
        summary.faults.push(ParseFault {
            line: line_no,
            message: format!("duplicate export `{name}`"),
        });
        return;
    }
    summary.exports.insert(ident, decl);
}

/// A valid name: an identifier of ASCII alphanumerics and underscores,
/// not starting with a digit.
fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> (ModuleSummary, Interner) {
        let interner = Interner::new();
        let summary = parse_module(src, &interner);
        (summary, interner)
    }

    #[test]
    fn declared_export() {
        let (summary, interner) = parse("foo: int");
        let foo = interner.get("foo").unwrap();
        let int = interner.get("int").unwrap();
        assert_eq!(summary.exports.get(&foo), Some(&ExportDecl::Declared(int)));
        assert!(summary.faults.is_empty());
    }

    #[test]
    fn alias_export() {
        let (summary, interner) = parse("bar = b.baz");
        let bar = interner.get("bar").unwrap();
        assert_eq!(
            summary.exports.get(&bar),
            Some(&ExportDecl::Alias {
                module: interner.get("b").unwrap(),
                name: interner.get("baz").unwrap(),
            })
        );
    }

    #[test]
    fn imports_collected() {
        let (summary, interner) = parse("use b\nuse c\nfoo: int");
        assert!(summary.imports.contains(&interner.get("b").unwrap()));
        assert!(summary.imports.contains(&interner.get("c").unwrap()));
        assert_eq!(summary.imports.len(), 2);
    }

    #[test]
    fn comments_and_blanks_ignored() {
        let (summary, _) = parse("# header\n\n   \nfoo: int\n# trailing");
        assert_eq!(summary.exports.len(), 1);
        assert!(summary.faults.is_empty());
    }

    #[test]
    fn malformed_line_is_a_fault() {
        let (summary, _) = parse("what even is this");
        assert!(summary.exports.is_empty());
        assert_eq!(summary.faults.len(), 1);
        assert_eq!(summary.faults[0].line, 1);
    }

    #[test]
    fn duplicate_export_keeps_first() {
        let (summary, interner) = parse("foo: int\nfoo: str");
        let foo = interner.get("foo").unwrap();
        let int = interner.get("int").unwrap();
        assert_eq!(summary.exports.get(&foo), Some(&ExportDecl::Declared(int)));
        assert_eq!(summary.faults.len(), 1);
        assert!(summary.faults[0].message.contains("duplicate"));
    }

    #[test]
    fn bad_alias_target_is_a_fault() {
        let (summary, _) = parse("foo = nodot");
        assert!(summary.exports.is_empty());
        assert_eq!(summary.faults.len(), 1);
        assert!(summary.faults[0].message.contains("module.name"));
    }

    #[test]
    fn bad_names_are_faults() {
        let (summary, _) = parse("9foo: int\nbar: 9int\nuse 9mod");
        assert!(summary.exports.is_empty());
        assert_eq!(summary.faults.len(), 3);
    }

    #[test]
    fn whitespace_is_forgiven() {
        let (summary, interner) = parse("  foo :  int  \n  bar=b.baz ");
        assert_eq!(summary.exports.len(), 2);
        assert!(summary.exports.contains_key(&interner.get("foo").unwrap()));
        assert!(summary.exports.contains_key(&interner.get("bar").unwrap()));
    }

    #[test]
    fn empty_source_is_empty_summary() {
        let (summary, _) = parse("");
        assert!(summary.exports.is_empty());
        assert!(summary.imports.is_empty());
        assert!(summary.faults.is_empty());
    }
}
