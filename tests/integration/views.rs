//! End-to-end view construction on realistic CodeSearchNet-style functions.

use func_views::{
    LocatorStrategy, TreeSitterError, ViewBuilder, ViewError, ViewOptions, NAME_MASK,
};

const DOCUMENTED: &str = r#"def get_vid_from_url(url):
    """Extracts video ID from URL.

    Handles both short and long forms.
    """
    # try the short form first
    return match1(url, r'youtu\.be/([^?/]+)') or \
        parse_query_param(url, 'v')  # fall back to the query string
"#;

fn builders() -> Vec<ViewBuilder> {
    [LocatorStrategy::Walk, LocatorStrategy::Query]
        .into_iter()
        .map(|strategy| {
            ViewBuilder::new(ViewOptions {
                strategy,
                ..ViewOptions::default()
            })
            .unwrap()
        })
        .collect()
}

#[test]
fn documented_function_views() {
    for mut builder in builders() {
        let views = builder.build(DOCUMENTED).unwrap();

        assert_eq!(views.name, "get_vid_from_url");
        assert!(views.body_with_comments.starts_with("\"\"\"Extracts video ID"));
        assert!(views.body_with_comments.contains("# try the short form first"));

        assert!(views.body_without_comments.starts_with("return match1(url"));
        assert!(!views.body_without_comments.contains('#'));
        assert!(!views.body_without_comments.contains("Extracts"));

        assert_eq!(
            views.masked_without_comments,
            "<NAME_MASK>(url):\n    return match1(url, r'youtu\\.be/([^?/]+)') or \\\n        parse_query_param(url, 'v')"
        );
    }
}

#[test]
fn strategies_produce_identical_views() {
    let sources = [
        DOCUMENTED,
        "def outer(a):\n    # helper below\n    def inner(b):\n        '''inner doc'''\n        return b\n    return inner(a)\n",
        "@property\ndef size(self):\n    return len(self._items)  # cached elsewhere\n",
        "class_level = 1\n\ndef f(x, *args, **kwargs) -> int:\n    \"doc\"\n    return x\n",
    ];
    let mut builders = builders();
    let (walk, query) = builders.split_at_mut(1);
    for source in sources {
        assert_eq!(
            walk[0].build(source).unwrap(),
            query[0].build(source).unwrap(),
            "strategies disagree on:\n{source}"
        );
    }
}

#[test]
fn masking_replaces_only_the_definition_name() {
    let source = "def foo(items):\n    \"\"\"foo the items.\"\"\"\n    foo_count = len(items)\n    return foo(items[1:]) if foo_count else 0\n";
    for mut builder in builders() {
        let views = builder.build(source).unwrap();
        let masked = &views.masked_without_comments;

        assert_eq!(masked.matches(NAME_MASK).count(), 1);
        assert!(masked.starts_with("<NAME_MASK>(items):"));
        // incidental occurrences stay untouched
        assert!(masked.contains("foo_count = len(items)"));
        assert!(masked.contains("return foo(items[1:])"));
        assert!(!masked.contains("def foo"));
    }
}

#[test]
fn stripping_only_removes_text() {
    let sources = [
        DOCUMENTED,
        "def plain(x):\n    return x\n",
        "def g():\n    # one\n    # two\n    '''three'''\n    pass\n",
    ];
    for mut builder in builders() {
        for source in sources {
            let views = builder.build(source).unwrap();
            assert!(views.body_with_comments.len() >= views.body_without_comments.len());
        }
    }
}

#[test]
fn nested_docstrings_and_comments_are_all_stripped() {
    let source = r#"def outer():
    """Outer."""
    def inner():
        """Inner."""
        # inner note
        return 1
    return inner()
"#;
    for mut builder in builders() {
        let views = builder.build(source).unwrap();
        assert_eq!(
            views.body_without_comments,
            "def inner():\n        return 1\n    return inner()"
        );
        assert_eq!(views.name, "outer");
    }
}

#[test]
fn lambda_only_source_is_record_error() {
    for mut builder in builders() {
        let err = builder.build("handler = lambda event: event.id\n").unwrap_err();
        assert_eq!(err, ViewError::Extraction(TreeSitterError::MissingName));
    }
}

#[test]
fn invalid_source_is_record_error() {
    for mut builder in builders() {
        let err = builder.build("def half(:\n").unwrap_err();
        assert!(err.is_record_local(), "{err}");
    }
}

#[test]
fn builder_is_reusable_after_failure() {
    for mut builder in builders() {
        assert!(builder.build("not python at all (((").is_err());
        let views = builder.build("def ok():\n    return True\n").unwrap();
        assert_eq!(views.name, "ok");
    }
}
