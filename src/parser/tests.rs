use super::*;
use crate::ast::{
    AssignOperator, BinaryOperator, Expression, LogicalOperator, StatementKind, TypeName,
    UnaryOperator,
};
use indoc::indoc;

fn ident(name: &str) -> Expression {
    Expression::Identifier(name.to_string())
}

fn num(value: f64) -> Expression {
    Expression::Number(value)
}

fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Expression {
    Expression::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn kinds(source: &str) -> Vec<StatementKind> {
    parse(source)
        .expect("parse failed")
        .statements
        .into_iter()
        .map(|statement| statement.kind)
        .collect()
}

fn first_error(source: &str) -> ParseErrorKind {
    parse(source).expect_err("expected parse error").0[0]
        .kind
        .clone()
}

#[test]
fn parses_simple_program() {
    let input = indoc! {"
        関数 足す(a, b):
            戻る a + b
        表示(足す(1, 2))
    "};
    let program = parse(input).expect("parse failed");
    assert_eq!(program.statements.len(), 2);

    let StatementKind::FunctionDecl(decl) = &program.statements[0].kind else {
        panic!("expected function declaration");
    };
    assert_eq!(decl.name.as_deref(), Some("足す"));
    assert_eq!(decl.params.len(), 2);
    assert_eq!(
        decl.body[0].kind,
        StatementKind::Return(Some(binary(ident("a"), BinaryOperator::Add, ident("b"))))
    );
    assert_eq!(program.statements[1].line, 3);
}

#[test]
fn follows_precedence_ladder() {
    let expr = parse_expression("1 + 2 * 3 ** 2 ** 1").expect("parse failed");
    let expected = binary(
        num(1.0),
        BinaryOperator::Add,
        binary(
            num(2.0),
            BinaryOperator::Mul,
            binary(
                num(3.0),
                BinaryOperator::Pow,
                binary(num(2.0), BinaryOperator::Pow, num(1.0)),
            ),
        ),
    );
    assert_eq!(expr, expected);
}

#[test]
fn logical_keywords_and_aliases_share_precedence() {
    let keyword = parse_expression("非 a かつ b または c").expect("parse failed");
    let symbolic = parse_expression("!a && b || c").expect("parse failed");
    assert_eq!(keyword, symbolic);
    let Expression::Logical { op, left, .. } = keyword else {
        panic!("expected logical expression");
    };
    assert_eq!(op, LogicalOperator::Or);
    assert!(matches!(
        *left,
        Expression::Logical {
            op: LogicalOperator::And,
            ..
        }
    ));
}

#[test]
fn unary_minus_binds_tighter_than_power() {
    let expr = parse_expression("-2 ** 2").expect("parse failed");
    let negated = Expression::UnaryOp {
        op: UnaryOperator::Negate,
        operand: Box::new(num(2.0)),
    };
    assert_eq!(expr, binary(negated, BinaryOperator::Pow, num(2.0)));
}

#[test]
fn parses_postfix_chains() {
    let expr = parse_expression("a.b[0](1).c").expect("parse failed");
    let expected = Expression::Member {
        object: Box::new(Expression::Call {
            callee: Box::new(Expression::Index {
                object: Box::new(Expression::Member {
                    object: Box::new(ident("a")),
                    name: "b".to_string(),
                }),
                index: Box::new(num(0.0)),
            }),
            args: vec![num(1.0)],
        }),
        name: "c".to_string(),
    };
    assert_eq!(expr, expected);
}

#[test]
fn distinguishes_bounded_loop_from_expression_statement() {
    let statements = kinds(indoc! {"
        i を 1 から 3 まで:
            表示(i)
        i = 4
    "});
    assert!(matches!(
        &statements[0],
        StatementKind::Range { variable, .. } if variable == "i"
    ));
    assert_eq!(
        statements[1],
        StatementKind::Assign {
            target: ident("i"),
            op: AssignOperator::Assign,
            value: num(4.0),
        }
    );
}

#[test]
fn distinguishes_function_declaration_from_literal() {
    let statements = kinds(indoc! {"
        関数 名前():
            戻る 1
        変数 f = 関数(x): 戻る x
        関数(y): 戻る y
    "});
    assert!(matches!(statements[0], StatementKind::FunctionDecl(_)));
    let StatementKind::VarDecl {
        value: Some(Expression::Function(decl)),
        ..
    } = &statements[1]
    else {
        panic!("expected function literal");
    };
    assert_eq!(decl.name, None);
    assert!(matches!(
        statements[2],
        StatementKind::Expr(Expression::Function(_))
    ));
}

#[test]
fn function_literal_with_indented_body_ends_statement() {
    let statements = kinds(indoc! {"
        変数 f = 関数(x):
            戻る x * 2
        表示(f(2))
    "});
    assert_eq!(statements.len(), 2);
}

#[test]
fn parses_comprehension_and_array() {
    let comprehension = parse_expression("[x * 2 各 x から xs もし x > 1]").expect("parse failed");
    let Expression::Comprehension {
        variable,
        condition,
        ..
    } = comprehension
    else {
        panic!("expected comprehension");
    };
    assert_eq!(variable, "x");
    assert!(condition.is_some());

    let array = parse_expression("[1, 2, 3,]").expect("parse failed");
    assert_eq!(array, Expression::Array(vec![num(1.0), num(2.0), num(3.0)]));
}

#[test]
fn bare_map_keys_become_strings() {
    let expr = parse_expression("{名前: \"太郎\", k + \"x\": 1}").expect("parse failed");
    let Expression::Map(entries) = expr else {
        panic!("expected map literal");
    };
    assert_eq!(entries[0].0, Expression::String("名前".to_string()));
    assert!(matches!(entries[1].0, Expression::BinaryOp { .. }));
}

#[test]
fn newlines_inside_brackets_are_ignored() {
    let statements = kinds(indoc! {"
        変数 xs = [
            1,
            2,
        ]
        表示(xs)
    "});
    assert_eq!(statements.len(), 2);
}

#[test]
fn parses_if_else_chain() {
    let statements = kinds(indoc! {"
        もし x > 1:
            表示(1)
        でなければ もし x > 0:
            表示(2)
        でなければ:
            表示(3)
    "});
    let StatementKind::If {
        else_body: Some(else_body),
        ..
    } = &statements[0]
    else {
        panic!("expected if with else");
    };
    assert!(matches!(
        else_body[0].kind,
        StatementKind::If {
            else_body: Some(_),
            ..
        }
    ));
}

#[test]
fn inline_blocks_close_at_terminator_keywords() {
    let statements = kinds("もし 真: x = 1 でなければ: x = 2\n");
    let StatementKind::If {
        then_body,
        else_body,
        ..
    } = &statements[0]
    else {
        panic!("expected if statement");
    };
    assert_eq!(then_body.len(), 1);
    assert_eq!(else_body.as_ref().map(Vec::len), Some(1));
}

#[test]
fn parses_try_catch_finally() {
    let statements = kinds(indoc! {"
        試す:
            投げる \"失敗\"
        捕捉 e:
            表示(e)
        最終:
            表示(\"後片付け\")
    "});
    let StatementKind::Try {
        catch: Some(catch),
        finally_body: Some(finally_body),
        ..
    } = &statements[0]
    else {
        panic!("expected try statement");
    };
    assert_eq!(catch.binding.as_deref(), Some("e"));
    assert_eq!(finally_body.len(), 1);
}

#[test]
fn try_requires_a_handler() {
    let error = first_error("試す:\n    x = 1\n");
    assert_eq!(error, ParseErrorKind::TryWithoutHandler);
}

#[test]
fn parses_class_with_fields_methods_and_initializer() {
    let statements = kinds(indoc! {"
        クラス 犬 継承 動物:
            変数 名前 = \"ポチ\"
            関数 初期化(名前):
                自分.名前 = 名前
            関数 鳴く() -> 文字列:
                戻る 親.鳴く() + \"ワン\"
    "});
    let StatementKind::ClassDecl(class) = &statements[0] else {
        panic!("expected class declaration");
    };
    assert_eq!(class.name, "犬");
    assert_eq!(class.parent.as_deref(), Some("動物"));
    assert_eq!(class.fields.len(), 1);
    assert!(class.initializer.is_some());
    assert_eq!(class.methods.len(), 1);
    assert_eq!(class.methods[0].return_type, Some(TypeName::String));
}

#[test]
fn rejects_statements_inside_class_body() {
    let error = first_error(indoc! {"
        クラス A:
            表示(1)
    "});
    assert!(matches!(error, ParseErrorKind::InvalidClassMember { .. }));
}

#[test]
fn desugars_decorators_innermost_first() {
    let statements = kinds(indoc! {"
        @外側
        @内側
        関数 f():
            戻る 1
    "});
    let StatementKind::Block(block) = &statements[0] else {
        panic!("expected desugared block");
    };
    assert!(matches!(block[0].kind, StatementKind::FunctionDecl(_)));
    let expected = Expression::Call {
        callee: Box::new(ident("外側")),
        args: vec![Expression::Call {
            callee: Box::new(ident("内側")),
            args: vec![ident("f")],
        }],
    };
    assert_eq!(
        block[1].kind,
        StatementKind::Assign {
            target: ident("f"),
            op: AssignOperator::Assign,
            value: expected,
        }
    );
}

#[test]
fn decorator_requires_function() {
    let error = first_error("@記録\n変数 x = 1\n");
    assert_eq!(error, ParseErrorKind::DecoratorWithoutFunction);
}

#[test]
fn match_groups_share_one_body_and_wildcard_becomes_default() {
    let statements = kinds(indoc! {"
        照合 x:
            場合 1, 2:
                表示(\"小\")
            場合 _:
                表示(\"他\")
            場合 3:
                表示(\"三\")
    "});
    let StatementKind::Match { cases, default, .. } = &statements[0] else {
        panic!("expected match statement");
    };
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0].patterns, vec![num(1.0), num(2.0)]);
    assert_eq!(cases[1].patterns, vec![num(3.0)]);
    assert!(default.is_some());
}

#[test]
fn duplicate_wildcard_is_an_error() {
    let error = first_error(indoc! {"
        照合 x:
            場合 _: 表示(1)
            場合 _: 表示(2)
    "});
    assert_eq!(error, ParseErrorKind::DuplicateWildcard);
}

#[test]
fn loop_control_outside_loop_is_an_error() {
    let error = first_error("中断\n");
    assert_eq!(
        error,
        ParseErrorKind::LoopControlOutsideLoop { keyword: "中断" }
    );

    // A function body resets loop nesting.
    let error = first_error(indoc! {"
        繰り返し 真:
            関数 f():
                次へ
    "});
    assert_eq!(
        error,
        ParseErrorKind::LoopControlOutsideLoop { keyword: "次へ" }
    );
}

#[test]
fn return_outside_function_is_an_error() {
    assert_eq!(first_error("戻る 1\n"), ParseErrorKind::ReturnOutsideFunction);
}

#[test]
fn rejects_invalid_assignment_target() {
    assert_eq!(
        first_error("f() = 1\n"),
        ParseErrorKind::InvalidAssignmentTarget
    );
}

#[test]
fn parses_compound_assignment_to_member() {
    let statements = kinds("自分.数 += 1\n");
    assert_eq!(
        statements[0],
        StatementKind::Assign {
            target: Expression::Member {
                object: Box::new(Expression::SelfRef),
                name: "数".to_string(),
            },
            op: AssignOperator::Compound(BinaryOperator::Add),
            value: num(1.0),
        }
    );
}

#[test]
fn parses_import_and_typed_declarations() {
    let statements = kinds(indoc! {"
        取り込む \"lib.ktb\"
        定数 上限: 数値 = 10
        変数 名前: 文字列
    "});
    assert_eq!(statements[0], StatementKind::Import("lib.ktb".to_string()));
    assert_eq!(
        statements[1],
        StatementKind::VarDecl {
            name: "上限".to_string(),
            constant: true,
            annotation: Some(TypeName::Number),
            value: Some(num(10.0)),
        }
    );
    assert!(matches!(
        statements[2],
        StatementKind::VarDecl { value: None, .. }
    ));
}

#[test]
fn const_requires_initializer() {
    assert!(matches!(
        first_error("定数 x\n"),
        ParseErrorKind::ConstWithoutValue { .. }
    ));
}

#[test]
fn recovers_and_collects_multiple_errors() {
    let input = indoc! {"
        変数 = 1
        表示(\"ok\")
        もし 1 +:
            表示(2)
        x = *
        表示(\"end\")
    "};
    let mut parser = Parser::new(input);
    let program = parser.parse_program();
    assert!(parser.had_error());
    assert_eq!(parser.errors().len(), 3);
    assert_eq!(parser.errors()[0].line, 1);
    assert_eq!(parser.errors()[2].line, 5);
    // The two well-formed calls survive recovery.
    assert_eq!(program.statements.len(), 2);

    let message = parser.error_message().expect("message");
    assert!(message.starts_with("[1行目] 構文エラー: "));

    parser.clear_error();
    assert!(!parser.had_error());
}

#[test]
fn recovery_resumes_at_a_statement_keyword_on_the_broken_line() {
    let mut parser = Parser::new("x = ) 定数 y = 2\nz = 関数(: 3\n表示(y)\n");
    let program = parser.parse_program();
    assert_eq!(parser.errors().len(), 2);
    let kinds: Vec<_> = program.statements.into_iter().map(|s| s.kind).collect();
    assert_eq!(kinds.len(), 2);
    assert!(matches!(
        &kinds[0],
        StatementKind::VarDecl { name, constant: true, .. } if name == "y"
    ));
    assert!(matches!(kinds[1], StatementKind::Expr(_)));
}

#[test]
fn lexer_errors_become_syntax_diagnostics() {
    let errors = parse("変数 s = \"閉じない\n").expect_err("expected error");
    assert!(matches!(
        errors.0[0].kind,
        ParseErrorKind::Lex(crate::lexer::error::LexError::UnterminatedString)
    ));
    assert!(errors.to_string().contains("文字列リテラルが閉じられていません"));
}

#[test]
fn unexpected_indent_is_reported() {
    let error = first_error("x = 1\n    y = 2\n");
    assert!(matches!(error, ParseErrorKind::UnexpectedBlock { .. }));
}

#[test]
fn parse_statement_entry_point_reads_one_statement() {
    let mut parser = Parser::new("x = 1\ny = 2\n");
    let first = parser.parse_statement().expect("statement");
    assert!(matches!(first.kind, StatementKind::Assign { .. }));
    let second = parser.parse_statement().expect("statement");
    assert_eq!(second.line, 2);
}

#[test]
fn moderate_nesting_parses() {
    let source = format!("表示({}1{})\n", "(".repeat(200), ")".repeat(200));
    assert!(parse(&source).is_ok());
    assert!(parse(&format!("x = {}1\n", "-".repeat(200))).is_ok());
}

#[test]
fn runaway_nesting_is_a_diagnostic() {
    let parens = format!("表示({}1{})\n", "(".repeat(200_000), ")".repeat(200_000));
    let errors = parse(&parens).expect_err("expected parse error");
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.0[0].kind,
        ParseErrorKind::NestingTooDeep { limit: MAX_NESTING }
    );
    assert!(errors.to_string().starts_with("[1行目] 構文エラー: 入れ子が深すぎます"));

    let signs = format!("x = {}1\n", "-".repeat(200_000));
    assert!(matches!(
        first_error(&signs),
        ParseErrorKind::NestingTooDeep { .. }
    ));

    let blocks = format!("{}表示(1)\n", "もし 真: ".repeat(MAX_NESTING + 1));
    assert!(matches!(
        first_error(&blocks),
        ParseErrorKind::NestingTooDeep { .. }
    ));
}
