//! Resource path helpers

/// Last `/`-delimited segment of a resource path
/// e.g., "//cloudresourcemanager.googleapis.com/folders/123" -> "123"
pub fn last_path_element(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Last two segments joined as `kind/id`, or `None` when the path is too short
/// e.g., "//cloudresourcemanager.googleapis.com/organizations/999" -> "organizations/999"
pub fn last_two_path_elements(path: &str) -> Option<String> {
    let mut parts = path.rsplit('/');
    let id = parts.next()?;
    let kind = parts.next()?;
    Some(format!("{}/{}", kind, id))
}
