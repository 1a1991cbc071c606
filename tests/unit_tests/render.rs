use crate::render;
use fenris_codegen::ast::{for_range, Expr, Literal, ScalarType, Statement, Storage, Symbol};
use fenris_codegen::render::{format_float, CRenderer};
use fenris_codegen::CodegenSettings;

fn sym(name: &str) -> Expr {
    Expr::from(Symbol::new(name))
}

fn render_expr(expr: &Expr) -> String {
    CRenderer::new(&CodegenSettings::default()).render_expr(expr)
}

#[test]
fn parentheses_follow_precedence() {
    assert_eq!(render_expr(&((sym("a") + sym("b")) * sym("c"))), "(a + b) * c");
    assert_eq!(render_expr(&(sym("a") + sym("b") * sym("c"))), "a + b * c");
    assert_eq!(render_expr(&(sym("a") - (sym("b") - sym("c")))), "a - (b - c)");
    assert_eq!(render_expr(&(sym("a") - (sym("b") + sym("c")))), "a - (b + c)");
    assert_eq!(render_expr(&(sym("a") + (sym("b") + sym("c")))), "a + b + c");
    assert_eq!(render_expr(&(sym("a") / (sym("b") * sym("c")))), "a / (b * c)");
    assert_eq!(render_expr(&(sym("a") * sym("b") / sym("c"))), "a * b / c");
    assert_eq!(render_expr(&(sym("a") + sym("b")).greater(sym("c"))), "a + b > c");
}

#[test]
fn calls_and_subscripts() {
    let expr = Expr::call("pow", vec![Expr::int(3), sym("order")]);
    assert_eq!(render_expr(&expr), "pow(3, order)");
    let expr = Symbol::new("T").at([sym("r"), sym("s") + 1usize]);
    assert_eq!(render_expr(&expr), "T[r][s + 1]");
}

#[test]
fn float_literals_round_trip() {
    assert_eq!(format_float(1.0, 17), "1.0");
    assert_eq!(format_float(0.5, 17), "0.5");
    assert_eq!(format_float(0.1, 17), "0.1");
    assert_eq!(format_float(-2.25, 17), "-2.25");
    assert_eq!(format_float(1.0 / 3.0, 17), format!("{:?}", 1.0 / 3.0));
    assert_eq!(format_float(1.0 / 3.0, 3), "0.333");
    assert_eq!(format_float(2.0 / 3.0, 2), "0.67");
}

#[test]
fn declarations_and_storage() {
    let statements = vec![
        Statement::VariableDecl {
            ty: ScalarType::Double,
            storage: Storage::Const,
            symbol: Symbol::new("x"),
            value: Expr::float(0.25),
        },
        Statement::ArrayDecl {
            ty: ScalarType::Double,
            storage: Storage::StaticConst,
            symbol: Symbol::new("X"),
            shape: vec![2, 2],
            values: Some(vec![Literal::Float(0.0), Literal::Float(1.0), Literal::Int(2), Literal::Float(0.5)]),
        },
        Statement::ArrayDecl {
            ty: ScalarType::Index,
            storage: Storage::Mutable,
            symbol: Symbol::new("n"),
            shape: vec![3],
            values: None,
        },
    ];
    insta::assert_snapshot!(render(&statements).trim_end(), @r###"
    const double x = 0.25;
    static const double X[2][2] = {0.0, 1.0, 2, 0.5};
    int64_t n[3];
    "###);
}

#[test]
fn nested_blocks_are_indented() {
    let statements = vec![for_range(
        Symbol::new("i"),
        0usize,
        2usize,
        vec![Statement::If {
            condition: sym("i").greater(0usize),
            body: vec![Statement::assign_add(Symbol::new("y").at([sym("i")]), sym("x"))],
        }],
    )];
    let expected = "\
for (int64_t i = 0; i < 2; ++i)
{
    if (i > 0)
    {
        y[i] += x;
    }
}
";
    assert_eq!(render(&statements), expected);

    let settings = CodegenSettings::default();
    let indented = CRenderer::new(&settings).render_statements(&statements, 2);
    assert!(indented.starts_with("        for (int64_t i = 0; i < 2; ++i)\n        {\n            if"));
}

#[test]
fn index_type_is_configurable() {
    let settings = CodegenSettings {
        index_type: "int".to_string(),
        ..CodegenSettings::default()
    };
    let statements = vec![
        Statement::index_table(Symbol::new("t"), &[4, 5]),
        for_range(Symbol::new("k"), 0usize, 2usize, Vec::new()),
    ];
    let rendered = CRenderer::new(&settings).render_statements(&statements, 0);
    assert_eq!(rendered, "const int t[2] = {4, 5};\nfor (int k = 0; k < 2; ++k)\n{\n}\n");
}

#[test]
fn raise_respects_warning_setting() {
    let error = Statement::Raise {
        message: "not \"available\"".to_string(),
        warning_only: false,
    };
    let warning = Statement::Raise {
        message: "not available".to_string(),
        warning_only: true,
    };
    assert_eq!(render(&[error]), "throw std::runtime_error(\"not \\\"available\\\"\");\n");
    assert_eq!(
        render(&[warning]),
        "std::cerr << \"*** warning: not available\" << std::endl;\n"
    );
}

#[test]
fn mem_copy() {
    let statement = Statement::MemCopy {
        ty: ScalarType::Double,
        source: Symbol::new("dof_X"),
        destination: Symbol::new("out"),
        count: Expr::int(6),
    };
    assert_eq!(render(&[statement]), "std::copy_n(dof_X, 6, out);\n");
}

#[test]
fn statements_after_blocks_are_rendered() {
    let statements = vec![
        for_range(Symbol::new("i"), 0usize, 1usize, vec![Statement::comment("first")]),
        Statement::If {
            condition: sym("n").greater(0usize),
            body: vec![for_range(Symbol::new("j"), 0usize, 2usize, Vec::new())],
        },
        Statement::Return(Expr::int(0)),
    ];
    let expected = "\
for (int64_t i = 0; i < 1; ++i)
{
    // first
}
if (n > 0)
{
    for (int64_t j = 0; j < 2; ++j)
    {
    }
}
return 0;
";
    assert_eq!(render(&statements), expected);
}
