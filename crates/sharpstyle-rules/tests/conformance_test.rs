//! End-to-end checks of the built-in rules
//!
//! This test suite covers:
//! - Dispatch over realistic files and message rendering
//! - Stability and determinism of finding sequences
//! - The parenthesis, keyword spacing, accessor and documentation cases
//! - Configuration driving the registry

use anyhow::Result;
use insta::assert_snapshot;

use sharpstyle_core::{ConfigLoader, EngineConfiguration, Finding, SourceUnit};
use sharpstyle_rules::{Dispatcher, FixEngine, RuleRegistry};

const WIDGET: &str = r#"namespace demo
{
    class Widget
    {
        /// <summary>
        /// </summary>
        public int Run(int a, int b)
        {
            if(a > b)
            {
                return (a - b);
            }
            return (b);
        }
    }
}
"#;

fn registry() -> RuleRegistry {
    sharpstyle_core::init_tracing();
    RuleRegistry::with_builtin_rules(EngineConfiguration::default())
        .expect("builtin registry builds")
}

fn parse(source: &str) -> SourceUnit {
    let (unit, errors) = SourceUnit::parse(source);
    assert!(errors.is_empty(), "test source must parse cleanly: {errors:?}");
    unit
}

fn render(registry: &RuleRegistry, unit: &SourceUnit, findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|finding| {
            format!(
                "{} {} {}",
                unit.location(finding.primary_span()),
                finding.rule_id(),
                registry.message(finding).unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn count(registry: &RuleRegistry, rule_id: &str, source: &str) -> usize {
    Dispatcher::new(registry)
        .collect_primary(&parse(source))
        .unwrap()
        .iter()
        .filter(|finding| finding.rule_id() == rule_id)
        .count()
}

fn method(body: &str) -> String {
    format!("class C\n{{\n    object M()\n    {{\n        {body}\n    }}\n}}\n")
}

#[test]
fn test_findings_of_a_file() -> Result<()> {
    let registry = registry();
    let unit = parse(WIDGET).with_path("Widget.cs");

    let findings = Dispatcher::new(&registry).collect_primary(&unit)?;

    assert_snapshot!(render(&registry, &unit, &findings), @r"
    Widget.cs:1:11 SA1300 Element 'demo' must begin with an uppercase letter
    Widget.cs:7:20 SA1606 Element documentation must have summary text
    Widget.cs:9:15 SA1000 The keyword 'if' must be followed by a space
    Widget.cs:11:24 SA1119 Statement must not use unnecessary parentheses
    Widget.cs:13:20 SA1119 Statement must not use unnecessary parentheses
    ");
    Ok(())
}

#[test]
fn test_fix_all_of_a_file() -> Result<()> {
    let registry = registry();
    let unit = parse(WIDGET);

    let outcome = FixEngine::new(&registry).fix_all(&unit)?;

    assert_snapshot!(outcome.unit.text(), @r"
    namespace demo
    {
        class Widget
        {
            /// <summary>
            /// </summary>
            public int Run(int a, int b)
            {
                if (a > b)
                {
                    return a - b;
                }
                return b;
            }
        }
    }
    ");
    let left: Vec<_> = outcome
        .unapplied
        .iter()
        .map(|fix| (fix.finding.rule_id(), fix.reason.to_string()))
        .collect();
    assert_eq!(
        left,
        [
            ("SA1300", "rule has no fix".to_string()),
            ("SA1606", "rule has no fix".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn test_records_carry_positions_and_arguments() -> Result<()> {
    let registry = registry();
    let unit = parse(WIDGET);

    let findings = Dispatcher::new(&registry).collect_primary(&unit)?;
    let record = unit.record(&findings[2]);

    assert_eq!(record.rule_id, "SA1000");
    assert_eq!((record.start_line, record.start_column), (9, 15));
    assert_eq!((record.end_line, record.end_column), (9, 15));
    assert_eq!(record.message_arguments, ["if", "", "followed"]);
    Ok(())
}

#[test]
fn test_clean_tree_stays_clean() -> Result<()> {
    let registry = registry();
    let unit = parse(WIDGET);
    let fixable = FixEngine::new(&registry).fix_all(&unit)?;

    let findings = Dispatcher::new(&registry)
        .restrict_to(["SA1000", "SA1119"])
        .collect(&fixable.unit)?;
    assert!(findings.is_empty(), "{findings:?}");

    let again = FixEngine::new(&registry).fix_all(&fixable.unit)?;
    assert!(!again.is_changed());
    assert_eq!(again.unit.text(), fixable.unit.text());
    Ok(())
}

#[test]
fn test_dispatch_is_deterministic() -> Result<()> {
    let registry = registry();
    let unit = parse(WIDGET);

    let first = Dispatcher::new(&registry).collect(&unit)?;
    let second = Dispatcher::new(&registry).collect(&unit)?;
    assert_eq!(first, second);

    let records = |findings: &[Finding]| -> Result<String> {
        let records: Vec<_> = findings.iter().map(|f| unit.record(f)).collect();
        Ok(serde_json::to_string(&records)?)
    };
    assert_eq!(records(&first)?, records(&second)?);
    Ok(())
}

#[test]
fn test_parenthesis_cases() {
    let registry = registry();
    let cases = [
        ("var x = (a + b);", 1),
        ("var s = (1).ToString();", 0),
        ("var s = (a).ToString();", 1),
        ("f = (x => x + 1);", 1),
        ("var y = c * (a + b);", 0),
        ("var z = (a ?? b).Length;", 0),
        ("M((a));", 1),
    ];
    for (body, expected) in cases {
        assert_eq!(count(&registry, "SA1119", &method(body)), expected, "{body}");
    }
}

#[test]
fn test_parenthesis_fixes() -> Result<()> {
    let registry = RuleRegistry::with_builtin_rules(
        ConfigLoader::from_toml_str("[rules]\nSA1000 = \"off\"")?,
    )?;
    let cases = [
        ("var x = (a + b);", "var x = a + b;"),
        ("f = (x => x + 1);", "f = x => x + 1;"),
        ("M((a));", "M(a);"),
    ];
    for (body, expected) in cases {
        let outcome = FixEngine::new(&registry).fix_all(&parse(&method(body)))?;
        assert_eq!(outcome.unit.text(), method(expected), "{body}");
    }
    Ok(())
}

#[test]
fn test_keyword_spacing_cases() -> Result<()> {
    let registry = registry();
    let unit = parse(&method("if(true) { } return ;"));

    let findings = Dispatcher::new(&registry).collect_primary(&unit)?;
    let arguments: Vec<_> = findings
        .iter()
        .map(|finding| finding.message_args().join("|"))
        .collect();
    assert_eq!(arguments, ["if||followed", "return| not|followed"]);

    let outcome = FixEngine::new(&registry).fix_all(&unit)?;
    assert_eq!(outcome.unit.text(), method("if (true) { } return;"));
    Ok(())
}

#[test]
fn test_lossless_rewrite_keeps_comments() -> Result<()> {
    let registry = registry();
    let source = method("var x = (/* sum */ a + b) // total\n            ;");
    let outcome = FixEngine::new(&registry).fix_all(&parse(&source))?;

    let expected = source.replacen("(/* sum */", "/* sum */", 1).replacen("b) //", "b //", 1);
    assert_eq!(outcome.unit.text(), expected);
    Ok(())
}

#[test]
fn test_accessor_and_documentation_cases() {
    let registry = registry();
    let mixed = "class C\n{\n    int X\n    {\n        get { return x; }\n        set\n        {\n            x = value;\n        }\n    }\n}\n";
    assert_eq!(count(&registry, "SA1504", mixed), 1);

    let documented = |doc: &str| format!("class C\n{{\n{doc}\n    public void Run() {{ }}\n}}\n");
    assert_eq!(
        count(&registry, "SA1606", &documented("    /// <summary>\n    ///  \n    /// </summary>")),
        1
    );
    assert_eq!(count(&registry, "SA1606", &documented("    /// <inheritdoc />")), 0);
    assert_eq!(count(&registry, "SA1606", &documented("")), 0);
}

#[test]
fn test_configuration_drives_registry() -> Result<()> {
    let config = ConfigLoader::from_toml_str(
        r#"
        [rules]
        SA1119 = "off"
        SA1606 = "error"

        [exemptions]
        typeNamePatterns = ["NativeMethods$"]
        "#,
    )?;
    let registry = RuleRegistry::with_builtin_rules(config)?;
    assert_eq!(registry.list_ids(), ["SA1000", "SA1300", "SA1504", "SA1606"]);
    assert_eq!(
        registry.severity("SA1606"),
        sharpstyle_core::RuleSeverity::Error
    );

    let source = "class NativeMethods\n{\n    static extern int getTickCount();\n    int M() { return (1); }\n}\n";
    let findings = Dispatcher::new(&registry).collect_primary(&parse(source))?;
    assert!(findings.is_empty(), "{findings:?}");
    Ok(())
}
