use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error("Please enter both source and destination.")]
    MissingEndpoints,
    #[error("Please enter source, destination, and stop.")]
    MissingViaFields,
    #[error("Please enter bus number.")]
    MissingBusNumber,
}

/// What the user searched for. Constructors trim input and reject blank fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    Direct { source: String, destination: String },
    Via { source: String, destination: String, stop: String },
    BusNumber(String),
}

fn required(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

impl SearchQuery {
    pub fn direct(source: &str, destination: &str) -> Result<Self, QueryError> {
        match (required(source), required(destination)) {
            (Some(source), Some(destination)) => Ok(Self::Direct { source, destination }),
            _ => Err(QueryError::MissingEndpoints),
        }
    }

    pub fn via(source: &str, destination: &str, stop: &str) -> Result<Self, QueryError> {
        match (required(source), required(destination), required(stop)) {
            (Some(source), Some(destination), Some(stop)) => Ok(Self::Via { source, destination, stop }),
            _ => Err(QueryError::MissingViaFields),
        }
    }

    pub fn bus_number(number: &str) -> Result<Self, QueryError> {
        required(number).map(Self::BusNumber).ok_or(QueryError::MissingBusNumber)
    }

    /// Swaps source and destination. Bus number searches are unchanged.
    pub fn reversed(self) -> Self {
        match self {
            Self::Direct { source, destination } => Self::Direct {
                source: destination,
                destination: source,
            },
            Self::Via { source, destination, stop } => Self::Via {
                source: destination,
                destination: source,
                stop,
            },
            other => other,
        }
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Direct { source, .. } | Self::Via { source, .. } => Some(source),
            Self::BusNumber(_) => None,
        }
    }

    pub fn destination(&self) -> Option<&str> {
        match self {
            Self::Direct { destination, .. } | Self::Via { destination, .. } => Some(destination),
            Self::BusNumber(_) => None,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::Direct { source, destination } => format!("{source} → {destination}"),
            Self::Via { source, destination, stop } => format!("{source} → {stop} → {destination}"),
            Self::BusNumber(number) => format!("Bus #{number}"),
        }
    }

    pub fn subtitle(&self, result_count: usize) -> String {
        match self {
            Self::Direct { .. } => {
                let plural = if result_count == 1 { "" } else { "es" };
                format!("{result_count} bus{plural} found")
            }
            Self::Via { stop, .. } => format!("Via {stop}"),
            Self::BusNumber(_) => "Bus details".to_owned(),
        }
    }
}
