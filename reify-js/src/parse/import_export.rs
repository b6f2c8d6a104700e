use super::ParseCtx;
use super::Parser;
use crate::ast::ExportName;
use crate::ast::ImportKind;
use crate::ast::ImportName;
use crate::ast::NodeId;
use crate::ast::Syntax;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::parse::expr::decode_string_body;
use crate::token::TT;

impl<'a> Parser<'a> {
  fn parse_module_specifier(&mut self) -> SyntaxResult<String> {
    let t = self.require(TT::LiteralString)?;
    let raw = self.str(t.loc);
    decode_string_body(&raw[1..raw.len() - 1])
      .ok_or_else(|| t.error(SyntaxErrorType::InvalidCharacterEscape))
  }

  /// `{ a, b as c, type D }`, with the opening brace already consumed.
  fn parse_import_names(&mut self, kind: ImportKind) -> SyntaxResult<Vec<ImportName>> {
    self.list(TT::Comma, TT::BraceClose, |p| {
      let (t0, t1) = p.peek_2();
      let kind = if t0.typ == TT::KeywordType
        && t1.typ.is_identifier_name()
        && t1.typ != TT::KeywordAs
      {
        p.consume();
        ImportKind::Type
      } else {
        kind
      };
      let imported = p.require_identifier_name()?;
      let local = if p.consume_if(TT::KeywordAs).is_match() {
        p.require_identifier()?
      } else {
        imported.clone()
      };
      Ok(ImportName {
        imported,
        local,
        kind,
      })
    })
  }

  pub fn parse_import(&mut self, _ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      p.require(TT::KeywordImport)?;
      let (t0, t1) = p.peek_2();
      if t0.typ == TT::LiteralString {
        let module = p.parse_module_specifier()?;
        p.require_semicolon()?;
        return Ok(Syntax::Import {
          kind: ImportKind::Value,
          default: None,
          namespace: None,
          names: Vec::new(),
          module,
        });
      };
      // `import type from "m"` imports a default binding called `type`.
      let kind = if t0.typ == TT::KeywordType && t1.typ != TT::KeywordFrom && t1.typ != TT::Comma {
        p.consume();
        ImportKind::Type
      } else {
        ImportKind::Value
      };
      if t0.typ == TT::KeywordTypeof {
        return Err(t0.error(SyntaxErrorType::Unsupported("typeof imports")));
      };
      let mut default = None;
      let mut namespace = None;
      let mut names = Vec::new();
      if p.is_identifier() {
        default = Some(p.require_identifier()?);
        if !p.consume_if(TT::Comma).is_match() {
          p.require(TT::KeywordFrom)?;
          let module = p.parse_module_specifier()?;
          p.require_semicolon()?;
          return Ok(Syntax::Import {
            kind,
            default,
            namespace,
            names,
            module,
          });
        };
      };
      if p.consume_if(TT::Asterisk).is_match() {
        p.require(TT::KeywordAs)?;
        namespace = Some(p.require_identifier()?);
      } else {
        p.require(TT::BraceOpen)?;
        names = p.parse_import_names(kind)?;
      };
      p.require(TT::KeywordFrom)?;
      let module = p.parse_module_specifier()?;
      p.require_semicolon()?;
      Ok(Syntax::Import {
        kind,
        default,
        namespace,
        names,
        module,
      })
    })
  }

  pub fn parse_export(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      p.require(TT::KeywordExport)?;
      let (t0, t1) = p.peek_2();
      match t0.typ {
        TT::KeywordDefault => {
          p.consume();
          let (t0, t1) = p.peek_2();
          let value = match t0.typ {
            TT::KeywordFunction => p.parse_func_decl(ctx)?,
            TT::KeywordAsync
              if t1.typ == TT::KeywordFunction && !t1.preceded_by_line_terminator =>
            {
              p.parse_func_decl(ctx)?
            }
            TT::KeywordClass => p.parse_class(ctx, true)?,
            _ => {
              let value = p.parse_expr_assign(ctx)?;
              p.require_semicolon()?;
              value
            }
          };
          Ok(Syntax::ExportDefault { value })
        }
        TT::Asterisk => {
          p.consume();
          let alias = if p.consume_if(TT::KeywordAs).is_match() {
            Some(p.require_identifier_name()?)
          } else {
            None
          };
          p.require(TT::KeywordFrom)?;
          let from = p.parse_module_specifier()?;
          p.require_semicolon()?;
          Ok(Syntax::ExportAll { alias, from })
        }
        TT::BraceOpen => p.parse_export_names(ImportKind::Value),
        TT::KeywordType if t1.typ == TT::BraceOpen => {
          p.consume();
          p.parse_export_names(ImportKind::Type)
        }
        _ => {
          let decl = p.parse_stmt(ctx)?;
          match p.ast().stx(decl) {
            Syntax::VarDecl { .. }
            | Syntax::Func { .. }
            | Syntax::Class { .. }
            | Syntax::TypeAlias { .. }
            | Syntax::Interface { .. } => Ok(Syntax::ExportDecl { decl }),
            _ => Err(t0.error(SyntaxErrorType::ExpectedSyntax("exportable declaration"))),
          }
        }
      }
    })
  }

  fn parse_export_names(&mut self, kind: ImportKind) -> SyntaxResult<Syntax> {
    self.require(TT::BraceOpen)?;
    let names = self.list(TT::Comma, TT::BraceClose, |p| {
      let local = p.require_identifier_name()?;
      let exported = if p.consume_if(TT::KeywordAs).is_match() {
        p.require_identifier_name()?
      } else {
        local.clone()
      };
      Ok(ExportName { local, exported })
    })?;
    let from = if self.consume_if(TT::KeywordFrom).is_match() {
      Some(self.parse_module_specifier()?)
    } else {
      None
    };
    self.require_semicolon()?;
    Ok(Syntax::ExportNamed { kind, names, from })
  }
}

#[cfg(test)]
mod tests {
  use crate::ast::ImportKind;
  use crate::ast::Syntax;
  use crate::parse;

  fn first_stmt(src: &str) -> Syntax {
    let ast = parse(src).unwrap();
    let Syntax::Program { body } = ast.stx(ast.root()) else {
      panic!("expected program");
    };
    ast.stx(body[0]).clone()
  }

  #[test]
  fn mixed_value_and_type_specifiers() {
    let Syntax::Import {
      kind,
      default,
      names,
      module,
      ..
    } = first_stmt("import React, { type Node, useState as use } from 'react';")
    else {
      panic!("expected import");
    };
    assert_eq!(kind, ImportKind::Value);
    assert_eq!(default.as_deref(), Some("React"));
    assert_eq!(module, "react");
    assert_eq!(names[0].kind, ImportKind::Type);
    assert_eq!(names[1].local, "use");
    assert_eq!(names[1].kind, ImportKind::Value);
  }

  #[test]
  fn type_only_import() {
    let Syntax::Import { kind, names, .. } = first_stmt("import type { A, B } from './types';")
    else {
      panic!("expected import");
    };
    assert_eq!(kind, ImportKind::Type);
    assert!(names.iter().all(|n| n.kind == ImportKind::Type));
  }

  #[test]
  fn exported_declarations() {
    assert!(matches!(
      first_stmt("export type Id = number;"),
      Syntax::ExportDecl { .. }
    ));
    assert!(matches!(
      first_stmt("export type { Id } from './id';"),
      Syntax::ExportNamed {
        kind: ImportKind::Type,
        from: Some(_),
        ..
      }
    ));
    assert!(matches!(
      first_stmt("export default class {}"),
      Syntax::ExportDefault { .. }
    ));
  }
}
