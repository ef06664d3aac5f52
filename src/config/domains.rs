use crate::HarvestError;
use std::collections::HashSet;
use std::path::Path;

/// Reads the domains list, one domain per line
///
/// Blank lines and lines starting with `#` are ignored. Repeated domains are
/// collapsed to their first occurrence so each site owns exactly one state.
pub fn load_domains(path: &Path) -> Result<Vec<String>, HarvestError> {
    let content = std::fs::read_to_string(path).map_err(|source| HarvestError::DomainsFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_domains(&content))
}

/// Parses the domains list from its text content
pub fn parse_domains(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut domains = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if seen.insert(line.to_string()) {
            domains.push(line.to_string());
        } else {
            tracing::warn!("Ignoring repeated domain entry: {}", line);
        }
    }

    domains
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let content = "# news sites\nexample.com\n\n   \n  # indented comment\nnews.example.org  \n";
        assert_eq!(
            parse_domains(content),
            vec!["example.com".to_string(), "news.example.org".to_string()]
        );
    }

    #[test]
    fn test_parse_collapses_repeats() {
        let content = "a.com\nb.com\na.com\n";
        assert_eq!(parse_domains(content), vec!["a.com", "b.com"]);
    }

    #[test]
    fn test_load_domains_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "example.com").unwrap();
        writeln!(file, "# skipped").unwrap();
        file.flush().unwrap();

        let domains = load_domains(file.path()).unwrap();
        assert_eq!(domains, vec!["example.com"]);
    }

    #[test]
    fn test_missing_domains_file() {
        let result = load_domains(Path::new("/nonexistent/wordpress.txt"));
        assert!(matches!(result, Err(HarvestError::DomainsFile { .. })));
    }
}
