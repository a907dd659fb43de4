//! Positional lookups against a loaded session.

use msbuild_lsp::model::{EvaluationError, ObjectHandle, ObjectKind};
use msbuild_lsp::xml::SyntaxKind;
use msbuild_lsp::{LineIndex, Position, SessionError, TextSize};
use rstest::rstest;
use tokio_util::sync::CancellationToken;

use crate::helpers::fixtures::{PROJECT, harness, offset_of};

fn position_of(needle: &str) -> Position {
    LineIndex::new(PROJECT)
        .offset_to_position(TextSize::new(offset_of(PROJECT, needle)))
        .unwrap()
}

#[tokio::test]
async fn test_lookups_need_a_document() {
    let h = harness();
    let at = Position::new(0, 0);

    assert!(matches!(
        h.session.find_syntax_at(at).await,
        Err(SessionError::NotLoaded("document"))
    ));
    assert!(matches!(
        h.session.find_evaluated_at(at).await,
        Err(SessionError::NotLoaded("document"))
    ));
    assert!(matches!(
        h.session.expression_at(at).await,
        Err(SessionError::NotLoaded(_))
    ));
}

#[tokio::test]
async fn test_evaluated_lookup_needs_an_evaluation() {
    let h = harness();
    h.engine.fail_loads(EvaluationError::invalid_project("bad", "MSB4025"));
    h.session.load(PROJECT, &CancellationToken::new()).await.unwrap();

    assert!(h.session.find_syntax_at(Position::new(0, 1)).await.unwrap().is_some());
    assert!(matches!(
        h.session.find_evaluated_at(Position::new(0, 1)).await,
        Err(SessionError::NotLoaded("evaluation"))
    ));
}

#[rstest]
#[case(Position::new(40, 0))]
#[case(Position::new(0, 400))]
#[tokio::test]
async fn test_position_outside_document(#[case] at: Position) {
    let h = harness();
    h.session.load(PROJECT, &CancellationToken::new()).await.unwrap();

    assert!(matches!(
        h.session.find_syntax_at(at).await,
        Err(SessionError::OutOfRange(_))
    ));
    assert!(matches!(
        h.session.find_evaluated_at(at).await,
        Err(SessionError::OutOfRange(_))
    ));
}

#[tokio::test]
async fn test_syntax_lookup_kinds() {
    let h = harness();
    h.session.load(PROJECT, &CancellationToken::new()).await.unwrap();

    let kind_at = |needle: &'static str| {
        let session = h.session.clone();
        async move {
            session
                .find_syntax_at(position_of(needle))
                .await
                .unwrap()
                .map(|node| node.kind())
        }
    };

    assert_eq!(kind_at("Include=\"a.cs").await, Some(SyntaxKind::ATTRIBUTE));
    assert_eq!(kind_at("\"a.cs;b.cs\"").await, Some(SyntaxKind::ATTRIBUTE_VALUE));
    assert_eq!(kind_at("net8.0").await, Some(SyntaxKind::TEXT));
}

#[rstest]
#[case("net8.0", 3, ObjectKind::Property)]
#[case("<TargetFramework>", 3, ObjectKind::Property)]
#[case("1</Foo>", 4, ObjectKind::Property)]
#[case("Condition=", 4, ObjectKind::Property)]
#[case("</PropertyGroup>", 2, ObjectKind::PropertyGroup)]
#[case("a.cs;b.cs", 6, ObjectKind::Item)]
#[case("Version=", 7, ObjectKind::Item)]
#[case("Sdk=", 1, ObjectKind::Other)]
#[tokio::test]
async fn test_innermost_evaluated_object(
    #[case] needle: &str,
    #[case] handle: u64,
    #[case] kind: ObjectKind,
) {
    let h = harness();
    h.session.load(PROJECT, &CancellationToken::new()).await.unwrap();

    let entry = h
        .session
        .find_evaluated_at(position_of(needle))
        .await
        .unwrap()
        .expect("an evaluated object");

    assert_eq!(entry.object.handle, ObjectHandle(handle));
    assert_eq!(entry.object.kind, kind);
    assert_eq!(entry.node_kind, SyntaxKind::ELEMENT);
}

#[tokio::test]
async fn test_nothing_evaluated_after_document_end() {
    let h = harness();
    h.session.load(PROJECT, &CancellationToken::new()).await.unwrap();

    // The trailing newline is outside the root element.
    let end = LineIndex::new(PROJECT).line_count() - 1;
    let entry = h.session.find_evaluated_at(Position::new(end, 0)).await.unwrap();
    assert!(entry.is_none());
}

#[tokio::test]
async fn test_one_based_positions_are_accepted() {
    let h = harness();
    h.session.load(PROJECT, &CancellationToken::new()).await.unwrap();

    let zero = h.session.find_evaluated_at(Position::new(2, 21)).await.unwrap();
    let one = h.session.find_evaluated_at(Position::one_based(3, 22)).await.unwrap();
    assert_eq!(
        zero.map(|e| e.object.handle),
        one.map(|e| e.object.handle)
    );
}
