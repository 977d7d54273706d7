//! Round-trip validation for the C# syntax model
//!
//! These tests check that parsing is lossless on realistic and malformed
//! input, that positions map back to the right lines, and that folding edits
//! leaves every byte outside the edited ranges untouched.

use sharpstyle_core::cst::{SyntaxKind, parse_csharp};
use sharpstyle_core::{
    CancellationToken, Edit, Finding, SourceUnit, SyntaxToken, SyntaxTokenExt, apply_edits,
};

const SERVICE: &str = r#"using System;
using System.Collections.Generic;

namespace Acme.Services
{
    /// <summary>Caches widgets.</summary>
    [Serializable]
    public sealed class WidgetCache<T> : IDisposable where T : class, new()
    {
        private readonly Dictionary<string, List<T>> items = new();
        public event EventHandler Changed;

        public WidgetCache() : base() { }

        ~WidgetCache() { }

        public T this[int index]
        {
            get { return Lookup(index); }
            set { Store(index, value); }
        }

        public int Count => items.Count;

        public async Task<int> LoadAsync(string key)
        {
            foreach (var item in items[key])
            {
                if (item is null || !(item is T)) continue;
                var size = checked((int)Measure(item) * 2);
                yield return size;
            }

            var query = from x in items
                        where x.Value.Count > 0
                        orderby x.Key
                        select x.Key;
            Func<int, int> twice = n => n * 2;
            switch (key)
            {
                case "a": goto case "b";
                case "b": break;
                default: throw new InvalidOperationException(nameof(key));
            }
            return await Task.FromResult(typeof(T) == null ? default : sizeof(int));
        }
    }
}
"#;

fn token(unit: &SourceUnit, text: &str) -> SyntaxToken {
    unit.root()
        .descendants_with_tokens()
        .filter_map(|element| element.into_token())
        .find(|token| token.text() == text)
        .unwrap()
}

#[test]
fn test_realistic_file_round_trips() {
    let (root, errors) = parse_csharp(SERVICE);

    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(root.text().to_string(), SERVICE);
    assert_eq!(root.kind(), SyntaxKind::CompilationUnit);
}

#[test]
fn test_malformed_input_round_trips() {
    let sources = [
        "class { void M( { if (",
        "namespace N { class C { int X { get; set } } ",
        "}}}} ;;; @@@ \"unterminated",
        "/* open comment",
        "#if DEBUG\nclass C { }\n#endif",
        "",
    ];
    for source in sources {
        let (root, _) = parse_csharp(source);
        assert_eq!(root.text().to_string(), source, "{source:?}");
    }
}

#[test]
fn test_crlf_positions() {
    let source = "class C\r\n{\r\n    void M() { }\r\n}\r\n";
    let (unit, errors) = SourceUnit::parse(source);
    assert!(errors.is_empty());

    let method = token(&unit, "M");
    let location = unit.location(method.text_range());
    assert_eq!((location.line, location.column), (3, 10));
    assert_eq!(unit.text(), source);
}

#[test]
fn test_comments_attach_to_neighbouring_tokens() {
    let source = "class C // trailing\n{\n    // leading\n    int x;\n}\n";
    let (unit, _) = SourceUnit::parse(source);

    let class_name = token(&unit, "C");
    let trailing: Vec<_> = class_name
        .trailing_trivia()
        .iter()
        .map(|trivia| trivia.text().to_string())
        .collect();
    assert_eq!(trailing, [" ", "// trailing", "\n"]);

    let int_kw = token(&unit, "int");
    let leading: Vec<_> = int_kw
        .leading_trivia()
        .iter()
        .filter(|trivia| trivia.kind().is_comment())
        .map(|trivia| trivia.text().to_string())
        .collect();
    assert_eq!(leading, ["// leading"]);
}

#[test]
fn test_folding_touches_only_edited_ranges() {
    let (unit, _) = SourceUnit::parse(SERVICE);
    let switch_kw = token(&unit, "switch");
    let twice = token(&unit, "twice");

    let space = Edit::new(Finding::new("SA1000", switch_kw.text_range()))
        .remove_token(&switch_kw.next_token().unwrap());
    let rename = Edit::new(Finding::new("TEST", twice.text_range())).replace_tokens(
        twice.text_range(),
        vec![sharpstyle_core::green_token(SyntaxKind::Ident, "doubled")],
    );

    let result = apply_edits(&unit, vec![space, rename], &CancellationToken::new()).unwrap();

    let expected = SERVICE
        .replacen("Func<int, int> twice", "Func<int, int> doubled", 1)
        .replacen("switch (key)", "switch(key)", 1);
    assert_eq!(result.unit.text(), expected);
    assert_eq!(result.edits.len(), 2);
    assert!(result.unapplied.is_empty());
}
