use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        FilterError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(FilterError::graph("x").to_string().contains("graph error:"));
    assert!(
        FilterError::allocation("x")
            .to_string()
            .contains("allocation error:")
    );
    assert!(FilterError::render("x").to_string().contains("render error:"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = FilterError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
