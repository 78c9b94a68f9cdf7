//! Free-text search and facet filtering over registry listings.

use crate::types::*;
use crate::wizard::ConfirmedBooking;
use std::collections::BTreeMap;
use std::str::FromStr;

/// A named filter dimension
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FacetName {
    Status,
    Priority,
    Category,
    Severity,
}

/// Facet selection; `All` places no constraint
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FacetValue {
    #[default]
    All,
    Only(String),
}

impl FromStr for FacetValue {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        Ok(match value.as_str() {
            "" | "all" | "todos" => FacetValue::All,
            _ => FacetValue::Only(value),
        })
    }
}

pub type Facets = BTreeMap<FacetName, FacetValue>;

/// Something that can be searched and faceted
pub trait Searchable {
    /// Fields matched against the free-text query
    fn search_fields(&self) -> Vec<&str>;

    /// Value of the named facet, or `None` if this entity has no such facet
    fn facet(&self, _name: FacetName) -> Option<&'static str> {
        None
    }
}

/// Filter `items` by `query` and `facets`, keeping the original order
///
/// A non-empty query must appear (case-insensitively) in at least one
/// searchable field. Each facet other than `All` must equal the item's value.
/// Facets an entity does not define are ignored.
pub fn filter<T: Searchable + Clone>(items: &[T], query: &str, facets: &Facets) -> Vec<T> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| matches_query(*item, &needle) && matches_facets(*item, facets))
        .cloned()
        .collect()
}

fn matches_query<T: Searchable>(item: &T, needle: &str) -> bool {
    needle.is_empty()
        || item
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

fn matches_facets<T: Searchable>(item: &T, facets: &Facets) -> bool {
    facets.iter().all(|(name, value)| match value {
        FacetValue::All => true,
        FacetValue::Only(wanted) => match item.facet(*name) {
            Some(actual) => actual == wanted,
            None => true,
        },
    })
}

// ============================================================================
// Per-entity search fields
// ============================================================================

impl Searchable for Patient {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.email.as_str(), self.phone.as_str()]
    }
}

impl Searchable for Service {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.description.as_str(),
            self.category.as_str(),
        ]
    }

    fn facet(&self, name: FacetName) -> Option<&'static str> {
        match name {
            FacetName::Status => Some(self.status.as_str()),
            _ => None,
        }
    }
}

impl Searchable for Professional {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.email.as_str(),
            self.specialty.as_str(),
            self.crm.as_str(),
        ]
    }

    fn facet(&self, name: FacetName) -> Option<&'static str> {
        match name {
            FacetName::Status => Some(self.status.as_str()),
            _ => None,
        }
    }
}

impl Searchable for Exam {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.patient.as_str(),
            self.kind.as_str(),
            self.physician.as_str(),
        ]
    }

    fn facet(&self, name: FacetName) -> Option<&'static str> {
        match name {
            FacetName::Status => Some(self.status.as_str()),
            FacetName::Priority => Some(self.priority.as_str()),
            FacetName::Category => Some(self.category.as_str()),
            FacetName::Severity => None,
        }
    }
}

impl Searchable for Prescription {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.physician.as_str(), self.diagnosis.as_str()];
        fields.extend(self.medications.iter().map(|m| m.name.as_str()));
        fields
    }

    fn facet(&self, name: FacetName) -> Option<&'static str> {
        match name {
            FacetName::Status => Some(self.status.as_str()),
            _ => None,
        }
    }
}

impl Searchable for Appointment {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.patient_name.as_str(),
            self.patient_email.as_str(),
            self.service.as_str(),
            self.professional.as_str(),
        ]
    }

    fn facet(&self, name: FacetName) -> Option<&'static str> {
        match name {
            FacetName::Status => Some(self.status.as_str()),
            _ => None,
        }
    }
}

impl Searchable for Allergy {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.substance.as_str(), self.reaction.as_str()]
    }

    fn facet(&self, name: FacetName) -> Option<&'static str> {
        match name {
            FacetName::Severity => Some(self.severity.as_str()),
            _ => None,
        }
    }
}

impl Searchable for ConfirmedBooking {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.patient_name(),
            self.patient_email(),
            self.patient_phone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn only(name: FacetName, value: &str) -> Facets {
        let mut facets = Facets::new();
        facets.insert(name, value.parse().unwrap());
        facets
    }

    #[test]
    fn test_empty_query_and_all_facets_is_identity() {
        let exams = fixtures::exams();
        let mut facets = Facets::new();
        facets.insert(FacetName::Status, FacetValue::All);
        facets.insert(FacetName::Priority, FacetValue::All);

        assert_eq!(filter(&exams, "", &facets), exams);
        assert_eq!(filter(&exams, "", &Facets::new()), exams);
    }

    #[test]
    fn test_query_is_case_insensitive() {
        let patients = fixtures::patients();
        let upper = filter(&patients, "MARIA", &Facets::new());
        let lower = filter(&patients, "maria", &Facets::new());

        assert_eq!(upper, lower);
        assert_eq!(upper.len(), 1);
        assert_eq!(upper[0].name, "Maria Silva");
    }

    #[test]
    fn test_filter_is_idempotent() {
        let exams = fixtures::exams();
        let facets = only(FacetName::Priority, "normal");

        let once = filter(&exams, "a", &facets);
        let twice = filter(&once, "a", &facets);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_facets_combine_with_query() {
        let exams = fixtures::exams();
        let mut facets = only(FacetName::Status, "pendente");
        facets.insert(FacetName::Priority, "urgente".parse().unwrap());

        let result = filter(&exams, "raio", &facets);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, "Raio-X Tórax");

        let none = filter(&exams, "hemograma", &facets);
        assert!(none.is_empty());
    }

    #[test]
    fn test_service_status_facet() {
        let services = fixtures::services();
        let inactive = filter(&services, "", &only(FacetName::Status, "inactive"));
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].name, "Procedimento Cirúrgico Menor");
    }

    #[test]
    fn test_prescription_matches_medication_names() {
        let prescriptions = fixtures::prescriptions();
        let result = filter(&prescriptions, "amoxicilina", &Facets::new());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].diagnosis, "Infecção respiratória");
    }

    #[test]
    fn test_order_is_preserved() {
        let services = fixtures::services();
        let result = filter(&services, "consulta", &Facets::new());
        let names: Vec<_> = result.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Consulta Geral", "Consulta de Retorno"]);
    }

    #[test]
    fn test_facet_value_sentinels() {
        assert_eq!("all".parse::<FacetValue>().unwrap(), FacetValue::All);
        assert_eq!("Todos".parse::<FacetValue>().unwrap(), FacetValue::All);
        assert_eq!(
            "Active".parse::<FacetValue>().unwrap(),
            FacetValue::Only("active".into())
        );
    }
}
