//! Input checks shared by the catalog services.

/// Longest display name accepted for countries, towns, shelters, pets and services
pub const NAME_MAX_CHARS: usize = 200;

/// Trim a display name and check it is present and not too long.
pub fn clean_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(format!("Name cannot exceed {} characters", NAME_MAX_CHARS));
    }
    Ok(name.to_string())
}

/// Case-insensitive substring match used by `?search=`. An empty or
/// missing term matches everything.
pub fn matches_search(name: &str, term: Option<&str>) -> bool {
    match term.map(str::trim).filter(|t| !t.is_empty()) {
        None => true,
        Some(term) => name.to_lowercase().contains(&term.to_lowercase()),
    }
}
