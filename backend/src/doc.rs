//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the HTTP endpoints of the inbound layer and the
//! schema wrappers that describe domain types without coupling them to
//! utoipa. Swagger UI serves it in debug builds.

use utoipa::OpenApi;

use crate::inbound::http::health::ProbeStatus;
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::votes::{SubmitVotesRequest, SubmitVotesResponse};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Q.Vote backend API",
        description = "Ballot submission for Q.Vote events, with optional phone verification."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::votes::submit_votes,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        SubmitVotesRequest,
        SubmitVotesResponse,
        ErrorSchema,
        ErrorCodeSchema,
        ProbeStatus
    )),
    tags(
        (name = "votes", description = "Ballot submission"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
