use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const ID_COL: &str = "template_id";
const DESCRIPTION_COL: &str = "description";
const CATEGORY_COL: &str = "category";
const TAGS_COL: &str = "tags";
const TAG_SEPARATOR: char = ';';

/// An advertisement template. Never mutated once the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "template_id")]
    pub id: u64,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
}

impl Template {
    pub fn new(id: u64, description: &str, category: &str, tags: &[&str]) -> Self {
        Self {
            id,
            description: description.to_string(),
            category: category.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// A copy of a template annotated with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTemplate {
    #[serde(flatten)]
    pub template: Template,
    pub score: f32,
}

/// The built-in catalog.
pub fn builtin_templates() -> Vec<Template> {
    vec![
        Template::new(1, "Best shoes for outdoor activities", "shoes", &["outdoor", "fashion"]),
        Template::new(2, "Exclusive fashion accessories", "fashion", &["luxury", "accessories"]),
        Template::new(3, "Top electronics for home use", "electronics", &["gadgets", "home"]),
        Template::new(4, "Running shoes with breathable mesh", "shoes", &["running", "comfort"]),
        Template::new(
            5,
            "Affordable kitchen appliances for daily cooking",
            "home",
            &["kitchen", "appliances"],
        ),
    ]
}

/// Loads templates from a CSV file with a `template_id,description,category,tags` header.
/// Tags are `;`-separated. Rows with an empty description are skipped.
pub fn load_templates_csv(csv_path: &Path) -> Result<Vec<Template>> {
    if !csv_path.exists() {
        return Err(anyhow!("Catalog CSV file not found at: {:?}", csv_path));
    }

    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open catalog CSV file at {:?}", csv_path))?;
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| anyhow!("Column '{}' not found", name))
    };
    let id_idx = column(ID_COL)?;
    let description_idx = column(DESCRIPTION_COL)?;
    let category_idx = column(CATEGORY_COL)?;
    let tags_idx = column(TAGS_COL)?;

    let mut templates = Vec::new();
    let mut seen_ids = HashSet::new();
    for (row_index, result) in rdr.records().enumerate() {
        let record =
            result.with_context(|| format!("Failed to read record at row index {}", row_index))?;

        let description = record.get(description_idx).unwrap_or_default().trim();
        if description.is_empty() {
            continue;
        }

        let raw_id = record.get(id_idx).unwrap_or_default().trim();
        let id: u64 = raw_id
            .parse()
            .with_context(|| format!("Invalid template id '{}' at row {}", raw_id, row_index))?;
        if !seen_ids.insert(id) {
            return Err(anyhow!("Duplicate template id {} at row {}", id, row_index));
        }

        let tags = record
            .get(tags_idx)
            .unwrap_or_default()
            .split(TAG_SEPARATOR)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();

        templates.push(Template {
            id,
            description: description.to_string(),
            category: record.get(category_idx).unwrap_or_default().trim().to_string(),
            tags,
        });
    }

    if templates.is_empty() {
        return Err(anyhow!("No templates loaded from {:?}", csv_path));
    }

    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(lines: &[&str]) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        for line in lines {
            writeln!(file, "{}", line)?;
        }
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_builtin_catalog_has_unique_ids() {
        let templates = builtin_templates();
        assert_eq!(templates.len(), 5);
        let ids: HashSet<u64> = templates.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 5);
        assert_eq!(templates[3].category, "shoes");
    }

    #[test]
    fn test_load_templates_csv_success() -> Result<()> {
        let file = write_csv(&[
            "template_id,description,category,tags",
            "10,Trail running shoes,shoes,running;outdoor",
            "11,,shoes,empty",
            "12,Smart kettle,home, kitchen ; ;gadgets",
        ])?;
        let templates = load_templates_csv(file.path())?;

        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].id, 10);
        assert_eq!(templates[0].tags, vec!["running", "outdoor"]);
        assert_eq!(templates[1].tags, vec!["kitchen", "gadgets"]);
        Ok(())
    }

    #[test]
    fn test_load_templates_csv_missing_column() -> Result<()> {
        let file = write_csv(&["template_id,description,tags", "1,Shoes,running"])?;
        let result = load_templates_csv(file.path());
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Column 'category' not found"));
        Ok(())
    }

    #[test]
    fn test_load_templates_csv_duplicate_id() -> Result<()> {
        let file = write_csv(&[
            "template_id,description,category,tags",
            "1,Shoes,shoes,",
            "1,More shoes,shoes,",
        ])?;
        let err = load_templates_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("Duplicate template id 1"));
        Ok(())
    }

    #[test]
    fn test_load_templates_csv_only_header() -> Result<()> {
        let file = write_csv(&["template_id,description,category,tags"])?;
        let err = load_templates_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("No templates loaded"));
        Ok(())
    }

    #[test]
    fn test_load_templates_csv_file_not_found() {
        let result = load_templates_csv(Path::new("no_such_catalog.csv"));
        assert!(result.unwrap_err().to_string().contains("Catalog CSV file not found"));
    }

    #[test]
    fn test_scored_template_serializes_flat() -> Result<()> {
        let scored = ScoredTemplate {
            template: Template::new(4, "Running shoes", "shoes", &["running"]),
            score: 0.5,
        };
        let value = serde_json::to_value(&scored)?;
        assert_eq!(value["template_id"], 4);
        assert_eq!(value["category"], "shoes");
        assert_eq!(value["score"], 0.5);
        Ok(())
    }
}
