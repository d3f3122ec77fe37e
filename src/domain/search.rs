//! Search outcome types and the simulated search backend.
//!
//! The workflow only talks to [`SearchBackend`]; [`SimulatedSearch`] is the
//! stand-in used until a real lookup service exists. Whether a simulated run
//! finds anything is decided by a [`FoundSource`] so both outcomes can be
//! pinned in tests.

use super::models::{Choice, Record};
use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Where a found item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoundItemKind {
    Location,
    Social,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundItem {
    pub kind: FoundItemKind,
    pub title: String,
    pub description: String,
    pub timestamp: String,
    pub link: Option<String>,
    pub link_text: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
}

/// Summary of the person the search was run for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub name: String,
    pub age: String,
    pub height: String,
    pub hair_color: String,
    pub photo_preview: Option<String>,
    pub summary: String,
}

/// Outcome of one search run. Never modified after it is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub found: bool,
    pub subject: SubjectSummary,
    pub items: Vec<FoundItem>,
    pub recommendations: Vec<Recommendation>,
}

/// Anything able to look a person up.
pub trait SearchBackend {
    fn search(&mut self, record: &Record, today: NaiveDate) -> SearchResult;
}

/// Decides whether a simulated search finds the person.
pub trait FoundSource {
    fn next_found(&mut self) -> bool;
}

/// Uniform random draw: found with probability `probability`.
#[derive(Debug, Clone)]
pub struct RandomFoundSource {
    probability: f64,
}

impl RandomFoundSource {
    pub const DEFAULT_PROBABILITY: f64 = 0.7;

    pub fn new(probability: f64) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
        }
    }
}

impl Default for RandomFoundSource {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROBABILITY)
    }
}

impl FoundSource for RandomFoundSource {
    fn next_found(&mut self) -> bool {
        rand::thread_rng().gen_bool(self.probability)
    }
}

/// Always answers the same way.
#[derive(Debug, Clone, Copy)]
pub struct FixedFoundSource(pub bool);

impl FoundSource for FixedFoundSource {
    fn next_found(&mut self) -> bool {
        self.0
    }
}

/// Demonstration search that returns canned results.
pub struct SimulatedSearch<S> {
    source: S,
}

impl<S: FoundSource> SimulatedSearch<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

const DEMO_AGE: &str = "37";

impl<S: FoundSource> SearchBackend for SimulatedSearch<S> {
    fn search(&mut self, record: &Record, today: NaiveDate) -> SearchResult {
        let found = self.source.next_found();
        let summary = if found {
            format!("Última informação registrada: {}", today.format("%d/%m/%Y"))
        } else {
            "Nenhuma informação recente encontrada.".to_string()
        };
        let subject = SubjectSummary {
            name: record.full_name.clone(),
            age: DEMO_AGE.to_string(),
            height: record.height.clone(),
            hair_color: record.hair_color.label().to_string(),
            photo_preview: record.photo.as_ref().map(|p| p.preview().to_string()),
            summary,
        };

        if found {
            SearchResult {
                found,
                subject,
                items: found_items(),
                recommendations: vec![
                    recommendation("Contatar o Hospital Regional", "Telefone: (11) 3456-7890"),
                    recommendation(
                        "Enviar mensagem via Facebook",
                        "Utilize o link do perfil acima para entrar em contato",
                    ),
                ],
            }
        } else {
            SearchResult {
                found,
                subject,
                items: Vec::new(),
                recommendations: not_found_recommendations(),
            }
        }
    }
}

fn recommendation(title: &str, description: &str) -> Recommendation {
    Recommendation {
        title: title.to_string(),
        description: description.to_string(),
    }
}

/// The three suggestions offered whenever nothing was found.
pub fn not_found_recommendations() -> Vec<Recommendation> {
    vec![
        recommendation(
            "Registro de Desaparecimento",
            "Registrar boletim de ocorrência na delegacia mais próxima",
        ),
        recommendation(
            "Ampliar a Busca",
            "Compartilhar informações em grupos e comunidades locais",
        ),
        recommendation(
            "Agendar Nova Busca",
            "Repetir a busca após 24 horas para verificar novas informações",
        ),
    ]
}

fn found_items() -> Vec<FoundItem> {
    vec![
        FoundItem {
            kind: FoundItemKind::Location,
            title: "Hospital Regional de São Paulo".to_string(),
            description: "Av. Brigadeiro Faria Lima, 5544 - Vila Olímpia, São Paulo/SP".to_string(),
            timestamp: "15/05/2023 às 14:30".to_string(),
            link: Some("https://www.openstreetmap.org/search?query=S%C3%A3o%20Paulo".to_string()),
            link_text: Some("Ver no OpenMap".to_string()),
            platform: None,
        },
        FoundItem {
            kind: FoundItemKind::Social,
            title: "Perfil encontrado".to_string(),
            description: "Atividade recente em grupo 'Moradores de Vila Nova'".to_string(),
            timestamp: "20/05/2023".to_string(),
            link: Some("https://www.facebook.com/groups/moradoresdevilanova".to_string()),
            link_text: Some("Ver perfil".to_string()),
            platform: Some("Facebook".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HairColor;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn record() -> Record {
        let mut record = Record::default();
        record.full_name = "Carlos Souza".into();
        record.height = "1,75".into();
        record.hair_color = HairColor::Grisalho;
        record
    }

    #[test]
    fn test_found_branch() {
        let mut backend = SimulatedSearch::new(FixedFoundSource(true));
        let result = backend.search(&record(), today());

        assert!(result.found);
        assert_eq!(result.subject.name, "Carlos Souza");
        assert_eq!(result.subject.hair_color, "Grisalho");
        assert_eq!(result.subject.summary, "Última informação registrada: 09/03/2024");
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].kind, FoundItemKind::Location);
        assert_eq!(result.items[1].kind, FoundItemKind::Social);
        assert!(result.items.iter().all(|i| i.link.is_some()));
        assert!(result.recommendations[0].title.contains("Hospital Regional"));
        assert!(result.recommendations[1].title.contains("Facebook"));
    }

    #[test]
    fn test_not_found_branch() {
        let mut backend = SimulatedSearch::new(FixedFoundSource(false));
        let result = backend.search(&record(), today());

        assert!(!result.found);
        assert!(result.items.is_empty());
        assert_eq!(result.subject.summary, "Nenhuma informação recente encontrada.");
        assert_eq!(result.recommendations, not_found_recommendations());
        assert_eq!(result.recommendations.len(), 3);
    }

    #[test]
    fn test_random_source_extremes() {
        let mut always = RandomFoundSource::new(1.0);
        let mut never = RandomFoundSource::new(0.0);
        for _ in 0..20 {
            assert!(always.next_found());
            assert!(!never.next_found());
        }
    }

    #[test]
    fn test_random_source_clamps_probability() {
        let mut source = RandomFoundSource::new(4.2);
        assert!(source.next_found());
    }

    #[test]
    fn test_result_round_trips_through_json() {
        let mut backend = SimulatedSearch::new(FixedFoundSource(true));
        let result = backend.search(&record(), today());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["items"][0]["kind"], "location");
        let back: SearchResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
