//! Travel executor: flight and hotel search.

use std::sync::Arc;

use {async_trait::async_trait, tracing::warn};

use donna_conversations::ToolSchema;

use crate::{ExecutorError, IntegrationExecutor, params};

/// Flight search backend (e.g. a SerpAPI Google Flights wrapper).
///
/// The query object is the schema-shaped argument map, passed through
/// verbatim minus the injected `user_id`.
#[async_trait]
pub trait FlightSearchService: Send + Sync {
    async fn search_flights(&self, query: &serde_json::Value) -> anyhow::Result<String>;
}

/// Hotel search backend.
#[async_trait]
pub trait HotelSearchService: Send + Sync {
    async fn search_hotels(&self, query: &serde_json::Value) -> anyhow::Result<String>;
}

pub struct TravelExecutor {
    flights: Arc<dyn FlightSearchService>,
    hotels: Arc<dyn HotelSearchService>,
}

impl TravelExecutor {
    pub fn new(flights: Arc<dyn FlightSearchService>, hotels: Arc<dyn HotelSearchService>) -> Self {
        Self { flights, hotels }
    }

    async fn search_flights(&self, args: &serde_json::Value) -> Result<String, ExecutorError> {
        params::require(args, "flight search", &["origin", "destination", "departure_date"])?;
        self.flights
            .search_flights(&strip_user_id(args))
            .await
            .map_err(|e| ExecutorError::downstream("searching for flights", e))
    }

    async fn search_hotels(&self, args: &serde_json::Value) -> Result<String, ExecutorError> {
        params::require(args, "hotel search", &["location", "check_in_date", "check_out_date"])?;
        self.hotels
            .search_hotels(&strip_user_id(args))
            .await
            .map_err(|e| ExecutorError::downstream("searching for hotels", e))
    }
}

/// The injected user id is dispatch plumbing, not a search parameter.
fn strip_user_id(args: &serde_json::Value) -> serde_json::Value {
    let mut query = args.clone();
    if let Some(map) = query.as_object_mut() {
        map.remove("user_id");
    }
    query
}

#[async_trait]
impl IntegrationExecutor for TravelExecutor {
    fn tools(&self) -> Vec<ToolSchema> {
        vec![
            ToolSchema {
                name: "search_flights".into(),
                description: "Search for flights between two airports with advanced options.".into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "origin": {"type": "string", "description": "The 3-letter airport code for the departure location"},
                        "destination": {"type": "string", "description": "The 3-letter airport code for the arrival location"},
                        "departure_date": {"type": "string", "description": "The date of departure in YYYY-MM-DD format"},
                        "return_date": {"type": "string", "description": "The date of return in YYYY-MM-DD format (optional for one-way trips)"},
                        "currency": {"type": "string", "description": "Currency code (e.g., USD, EUR)"},
                        "adults": {"type": "string", "description": "Number of adult passengers"},
                        "stops": {"type": "string", "description": "Number of stops (e.g., '0' for non-stop, '1' for one stop)"},
                        "max_price": {"type": "string", "description": "Maximum price for flights"}
                    },
                    "required": ["origin", "destination", "departure_date"]
                }),
            },
            ToolSchema {
                name: "search_hotels".into(),
                description: "Search for hotels at a location with advanced options.".into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "location": {"type": "string", "description": "The city or area to search for hotels"},
                        "check_in_date": {"type": "string", "description": "Check-in date in YYYY-MM-DD format"},
                        "check_out_date": {"type": "string", "description": "Check-out date in YYYY-MM-DD format"},
                        "currency": {"type": "string", "description": "Currency code (e.g., USD, EUR)"},
                        "adults": {"type": "string", "description": "Number of adult guests"},
                        "max_price": {"type": "string", "description": "Maximum price per night"}
                    },
                    "required": ["location", "check_in_date", "check_out_date"]
                }),
            },
        ]
    }

    fn instructions(&self) -> String {
        "You are a Travel Assistant. Your responsibilities include:\n\
         - Assisting users in planning their trips.\n\
         - Searching for flights and hotels.\n\
         - Providing travel recommendations.\n\n\
         When a user asks for flight or hotel information, always use the appropriate function call:\n\
         - For flights, use the 'search_flights' function.\n\
         - For hotels, use the 'search_hotels' function."
            .to_string()
    }

    async fn execute(&self, function_name: &str, args: &serde_json::Value) -> String {
        let result = match function_name {
            "search_flights" => self.search_flights(args).await,
            "search_hotels" => self.search_hotels(args).await,
            other => Err(ExecutorError::UnknownFunction(other.to_string())),
        };
        result.unwrap_or_else(|e| {
            warn!(function = function_name, error = %e, "travel function degraded to error text");
            e.to_string()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    struct FakeFlights;
    struct FakeHotels;

    #[async_trait]
    impl FlightSearchService for FakeFlights {
        async fn search_flights(&self, query: &serde_json::Value) -> anyhow::Result<String> {
            assert!(query.get("user_id").is_none(), "user_id must be stripped");
            Ok(format!(
                "Flights from {} to {}",
                query["origin"].as_str().unwrap(),
                query["destination"].as_str().unwrap()
            ))
        }
    }

    #[async_trait]
    impl HotelSearchService for FakeHotels {
        async fn search_hotels(&self, _query: &serde_json::Value) -> anyhow::Result<String> {
            anyhow::bail!("quota exceeded")
        }
    }

    fn executor() -> TravelExecutor {
        TravelExecutor::new(Arc::new(FakeFlights), Arc::new(FakeHotels))
    }

    #[tokio::test]
    async fn flight_search_passes_query_through() {
        let args = serde_json::json!({
            "origin": "SFO",
            "destination": "JFK",
            "departure_date": "2024-12-01",
            "user_id": "slack_U1",
        });
        let out = executor().execute("search_flights", &args).await;
        assert_eq!(out, "Flights from SFO to JFK");
    }

    #[tokio::test]
    async fn missing_flight_parameters_are_listed() {
        let out = executor()
            .execute("search_flights", &serde_json::json!({"origin": "SFO"}))
            .await;
        assert_eq!(
            out,
            "Missing required parameters for flight search: destination, departure_date"
        );
    }

    #[tokio::test]
    async fn hotel_backend_failure_degrades_to_text() {
        let args = serde_json::json!({
            "location": "Lisbon",
            "check_in_date": "2024-12-01",
            "check_out_date": "2024-12-05",
        });
        let out = executor().execute("search_hotels", &args).await;
        assert_eq!(
            out,
            "An error occurred while searching for hotels: quota exceeded"
        );
    }
}
