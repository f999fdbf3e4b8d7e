use serde::{Deserialize, Serialize};

/// A bookable service category ("occupation").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
}

impl ServiceCategory {
    fn new(id: &str, name: &str, icon: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            description: description.to_string(),
        }
    }
}

/// Catalogue installed the first time it is read from an empty store.
pub fn default_categories() -> Vec<ServiceCategory> {
    vec![
        ServiceCategory::new("plumber", "Plumber", "wrench", "Pipe repairs, leaks, installations"),
        ServiceCategory::new("electrician", "Electrician", "zap", "Electrical repairs and installations"),
        ServiceCategory::new("ac-repair", "AC Repair", "wind", "Air conditioning repair and maintenance"),
        ServiceCategory::new("carpenter", "Carpenter", "hammer", "Furniture and wood work"),
        ServiceCategory::new("gardener", "Gardener", "leaf", "Garden maintenance and landscaping"),
        ServiceCategory::new("gas-repair", "Gas Repair", "flame", "Gas line repairs and installations"),
        ServiceCategory::new("painter", "Painter", "paintbrush", "Interior and exterior painting"),
        ServiceCategory::new("cleaner", "House Cleaning", "sparkles", "Deep cleaning services"),
        ServiceCategory::new("pest-control", "Pest Control", "bug", "Pest elimination services"),
        ServiceCategory::new("appliance-repair", "Appliance Repair", "settings", "Home appliance repairs"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_ids_are_unique() {
        let cats = default_categories();
        let ids: HashSet<_> = cats.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), cats.len());
        assert!(ids.contains("plumber"));
        assert!(ids.contains("appliance-repair"));
    }
}
