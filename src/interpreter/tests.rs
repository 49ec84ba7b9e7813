use super::*;
use crate::parser::parse_expression;
use indoc::indoc;

fn run_with(config: Config, source: &str) -> Interpreter {
    let mut interpreter = Interpreter::with_config(config);
    interpreter.run_source(source);
    interpreter
}

fn output(source: &str) -> Vec<String> {
    let mut interpreter = run_with(Config::default(), source);
    assert!(
        !interpreter.had_error(),
        "unexpected error: {:?}",
        interpreter.error_message()
    );
    interpreter.take_output()
}

fn error(source: &str) -> String {
    run_with(Config::default(), source)
        .error_message()
        .expect("expected an error")
}

#[test]
fn numeric_edge_cases() {
    assert_eq!(
        output(r#"表示(2 ** 10, "a" + 1, 7 % 3, 1 / 4, -2 ** 2)"#),
        ["1024 a1 1 0.25 4"]
    );
    assert_eq!(
        error("表示(5 / 0)"),
        "[1行目] 実行時エラー: 0 で割ることはできません"
    );
}

#[test]
fn stringifies_nested_values() {
    let source = r#"表示([1, "a", 真, 無], {"k": 1, 名前: "x"}, 1.5)"#;
    assert_eq!(
        output(source),
        [r#"[1, "a", 真, 無] {"k": 1, "名前": "x"} 1.5"#]
    );
}

#[test]
fn closures_share_their_captured_scope() {
    let source = indoc! {"
        関数 カウンタ():
            変数 n = 0
            関数 増やす():
                n += 1
                戻る n
            関数 読む():
                戻る n
            戻る [増やす, 読む]
        変数 fs = カウンタ()
        fs[0]()
        fs[0]()
        表示(fs[1]())
    "};
    assert_eq!(output(source), ["2"]);
}

#[test]
fn assignment_copies_aggregates() {
    let source = indoc! {"
        変数 a = [1, 2, 3]
        変数 b = a
        b[0] = 9
        表示(a, b)
    "};
    assert_eq!(output(source), ["[1, 2, 3] [9, 2, 3]"]);
}

#[test]
fn nested_index_and_member_writes() {
    let source = indoc! {r#"
        変数 grid = [[0, 0], [0, 0]]
        grid[1][0] = 5
        変数 m = {}
        m.a = 1
        m["b"] = 2
        m.a += 10
        表示(grid, m, m.c)
    "#};
    assert_eq!(output(source), [r#"[[0, 0], [5, 0]] {"a": 11, "b": 2} 無"#]);
}

#[test]
fn user_functions_check_arity() {
    let source = indoc! {"
        関数 足す(a, b):
            戻る a + b
        足す(1)
    "};
    assert_eq!(
        error(source),
        "[3行目] 実行時エラー: 関数 '足す' の引数は 2 個ですが 1 個渡されました"
    );
    assert!(error(&source.replace("足す(1)\n", "足す(1, 2, 3)\n")).contains("3 個渡されました"));
}

#[test]
fn finally_runs_before_rethrow() {
    let source = indoc! {r#"
        関数 f():
            試す:
                投げる "X"
            最終:
                表示("Y")
        試す:
            f()
        捕捉 e:
            表示("捕捉", e)
    "#};
    assert_eq!(output(source), ["Y", "捕捉 X"]);
}

#[test]
fn finally_does_not_override_pending_return() {
    let source = indoc! {r#"
        関数 g():
            試す:
                投げる "e"
            捕捉 e:
                戻る e
            最終:
                表示("最終")
                変数 z = 1
        表示(g())
    "#};
    assert_eq!(output(source), ["最終", "e"]);
}

#[test]
fn finally_restores_pending_break() {
    let source = indoc! {r#"
        i を 1 から 5 まで:
            試す:
                もし i == 2:
                    中断
            最終:
                表示("f", i)
    "#};
    assert_eq!(output(source), ["f 1", "f 2"]);
}

#[test]
fn runtime_errors_are_not_catchable() {
    let source = indoc! {r#"
        試す:
            表示(1 / 0)
        捕捉 e:
            表示("捕捉")
    "#};
    let mut interpreter = run_with(Config::default(), source);
    assert!(interpreter.had_error());
    assert!(interpreter.take_output().is_empty());
}

#[test]
fn uncaught_throw_becomes_a_diagnostic() {
    assert_eq!(
        error("\n投げる \"失敗\""),
        "[2行目] 例外: 捕捉されない例外: 失敗"
    );
}

#[test]
fn subclass_inherits_initializer() {
    let source = indoc! {"
        クラス A:
            関数 初期化():
                自分.x = 1
        クラス B 継承 A:
            関数 名前():
                戻る \"B\"
        変数 b = 新規 B()
        表示(b.x, b.名前())
    "};
    assert_eq!(output(source), ["1 B"]);
}

#[test]
fn initializer_receives_arguments() {
    let source = indoc! {"
        クラス 点:
            変数 x = 0
            変数 y = 0
            関数 初期化(x, y):
                自分.x = x
                自分.y = y
        変数 p = 新規 点(3, 4)
        表示(p.x + p.y, 型(p))
    "};
    assert_eq!(output(source), ["7 インスタンス"]);
}

#[test]
fn mutator_methods_write_back_to_the_receiver() {
    let source = indoc! {"
        クラス カウンタ:
            変数 値 = 0
            関数 増やす():
                自分.値 += 1
        変数 c = 新規 カウンタ()
        c.増やす()
        c.増やす()
        変数 holder = {\"c\": c}
        holder.c.増やす()
        表示(c.値, holder.c.値)
    "};
    assert_eq!(output(source), ["2 3"]);
}

#[test]
fn stored_bound_methods_leave_their_container_alone() {
    let source = indoc! {"
        クラス カウンタ:
            変数 値 = 0
            関数 増やす():
                自分.値 += 1
        変数 c = 新規 カウンタ()
        変数 m = {\"f\": c.増やす, \"name\": \"box\"}
        m.f()
        表示(型(m), m[\"name\"], c.値)
        クラス 入れ物:
            変数 g = 無
        変数 h = 新規 入れ物()
        h.g = c.増やす
        h.g()
        表示(型(h), h.g == 無)
    "};
    assert_eq!(output(source), ["辞書 box 0", "インスタンス 偽"]);
}

#[test]
fn constant_receivers_allow_reading_methods() {
    let source = indoc! {"
        クラス 箱:
            変数 中身 = 5
            関数 取る():
                戻る 自分.中身
        定数 b = 新規 箱()
        表示(b.取る())
    "};
    assert_eq!(output(source), ["5"]);
}

#[test]
fn super_calls_start_above_the_defining_class() {
    let source = indoc! {r#"
        クラス 動物:
            関数 鳴く():
                戻る "..."
        クラス 犬 継承 動物:
            関数 鳴く():
                戻る "ワン" + 親.鳴く()
        クラス 子犬 継承 犬:
            関数 名前():
                戻る "子犬"
        変数 d = 新規 子犬()
        表示(d.鳴く())
    "#};
    assert_eq!(output(source), ["ワン..."]);
}

#[test]
fn bounded_loop_is_inclusive_in_both_directions() {
    let source = indoc! {"
        i を 3 から 1 まで:
            表示(i)
        j を 1 から 2 まで:
            表示(j)
    "};
    assert_eq!(output(source), ["3", "2", "1", "1", "2"]);
}

#[test]
fn bounded_loop_variable_is_shared_by_closures() {
    let source = indoc! {"
        変数 fs = []
        i を 1 から 3 まで:
            関数 読む():
                戻る i
            fs = 追加(fs, 読む)
        表示(fs[0](), fs[2]())
    "};
    assert_eq!(output(source), ["3 3"]);
}

#[test]
fn while_loop_handles_break_and_continue() {
    let source = indoc! {"
        変数 i = 0
        変数 合計 = 0
        繰り返し 真:
            i += 1
            もし i > 5:
                中断
            もし i % 2 == 0:
                次へ
            合計 += i
        表示(合計)
    "};
    assert_eq!(output(source), ["9"]);
}

#[test]
fn for_each_walks_every_iterable_kind() {
    let source = indoc! {r#"
        各 c から "あい":
            表示(c)
        各 k から {"x": 1, "y": 2}:
            表示(k)
        各 n から 範囲(2):
            表示(n)
        変数 g = 反復子([1, 2, 3])
        次(g)
        各 v から g:
            表示(v)
    "#};
    assert_eq!(output(source), ["あ", "い", "x", "y", "0", "1", "2", "3"]);
}

#[test]
fn comprehension_filters_in_its_own_scope() {
    let source = indoc! {"
        変数 x = 100
        表示([x * x 各 x から [1, 2, 3, 4] もし x % 2 == 0], x)
    "};
    assert_eq!(output(source), ["[4, 16] 100"]);
}

#[test]
fn match_runs_wildcard_only_when_nothing_matched() {
    let source = indoc! {r#"
        関数 分類(n):
            照合 n:
                場合 _:
                    戻る "その他"
                場合 1, 2:
                    戻る "小"
                場合 "a":
                    戻る "文字"
        表示(分類(2), 分類("a"), 分類(9))
    "#};
    assert_eq!(output(source), ["小 文字 その他"]);
}

#[test]
fn logical_operators_return_the_deciding_operand() {
    assert_eq!(
        output(r#"表示(無 または "既定", 0 かつ 1, 1 かつ 2, 非 0)"#),
        ["既定 0 2 真"]
    );
}

#[test]
fn constants_cannot_be_reassigned() {
    let source = indoc! {"
        定数 x = 1
        x = 2
    "};
    assert_eq!(
        error(source),
        "[2行目] 実行時エラー: 定数 'x' には再代入できません"
    );
}

#[test]
fn undefined_names_report_their_line() {
    let source = indoc! {"
        変数 a = 1
        表示(b)
    "};
    assert_eq!(error(source), "[2行目] 実行時エラー: 未定義の変数 'b'");
}

#[test]
fn depth_ceiling_raises_stack_overflow() {
    let source = indoc! {"
        関数 f(n):
            戻る f(n + 1)
        f(0)
    "};
    let interpreter = run_with(Config::default().with_max_depth(200), source);
    assert!(
        interpreter
            .error_message()
            .expect("expected overflow")
            .contains("呼び出しが深すぎます (上限 200)")
    );
}

#[test]
fn entry_point_runs_after_top_level() {
    let source = indoc! {r#"
        関数 主():
            表示("主")
            戻る 7
        表示("先")
    "#};
    let program = crate::parser::parse(source).expect("parse failed");
    let mut interpreter = Interpreter::new();
    assert_eq!(interpreter.run(&program), Value::Number(7.0));
    assert_eq!(interpreter.output(), ["先", "主"]);

    let source = source.replace("主", "開始");
    let interpreter = run_with(Config::default().with_entry_point("開始"), &source);
    assert_eq!(interpreter.output(), ["先", "開始"]);
}

#[test]
fn decorators_wrap_the_function() {
    let source = indoc! {"
        関数 二倍(f):
            関数 包む(x):
                戻る f(x) * 2
            戻る 包む
        @二倍
        関数 三(x):
            戻る x + 1
        表示(三(4))
    "};
    assert_eq!(output(source), ["10"]);
}

#[test]
fn imports_run_each_file_once() {
    let root = std::env::temp_dir().join(format!("kotoba-import-{}", std::process::id()));
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("lib.ktb"), "変数 共有 = 42\n表示(\"読込\")\n").unwrap();

    let source = indoc! {r#"
        取り込む "lib.ktb"
        取り込む "lib.ktb"
        表示(共有)
    "#};
    let mut interpreter = run_with(Config::default().with_module_root(&root), source);
    assert!(!interpreter.had_error(), "{:?}", interpreter.error_message());
    assert_eq!(interpreter.take_output(), ["読込", "42"]);

    let interpreter = run_with(
        Config::default().with_module_root(&root),
        "取り込む \"missing.ktb\"",
    );
    assert!(
        interpreter
            .error_message()
            .expect("expected import failure")
            .contains("ファイル 'missing.ktb' を取り込めません")
    );
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn syntax_errors_stop_before_running() {
    let mut interpreter = Interpreter::new();
    interpreter.run_source("表示(\"走らない\")\nx = *\n");
    assert!(interpreter.take_output().is_empty());
    let message = interpreter.error_message().expect("expected syntax error");
    assert!(message.starts_with("[2行目] 構文エラー"), "{message}");

    interpreter.clear_error();
    assert!(!interpreter.had_error());
    interpreter.run_source("表示(1)");
    assert_eq!(interpreter.take_output(), ["1"]);
}

#[test]
fn evaluates_standalone_expressions() {
    let mut interpreter = Interpreter::new();
    interpreter.define_global("x", Value::Number(4.0));
    let expression = parse_expression("x * 2 + 長さ([1, 2])").unwrap();
    assert_eq!(interpreter.eval_expression(&expression), Value::Number(10.0));
}

#[test]
fn host_globals_override_script_constants() {
    let mut interpreter = Interpreter::new();
    interpreter.run_source("定数 上限 = 1");
    interpreter.define_global("上限", Value::Number(10.0));
    assert_eq!(interpreter.global("上限"), Some(Value::Number(10.0)));

    interpreter.run_source("上限 = 上限 + 1\n表示(上限)");
    assert!(!interpreter.had_error(), "{:?}", interpreter.error_message());
    assert_eq!(interpreter.take_output(), ["11"]);
}

#[test]
fn interpreter_state_recovers_after_runtime_error() {
    let mut interpreter = Interpreter::new();
    interpreter.run_source(indoc! {"
        関数 f():
            戻る 1 / 0
        f()
    "});
    assert!(interpreter.had_error());
    interpreter.clear_error();
    interpreter.run_source("表示(f)");
    assert!(!interpreter.had_error());
    assert_eq!(interpreter.take_output(), ["<関数 f>"]);
}
