//! Ballot submission HTTP handler.
//!
//! ```text
//! POST /api/v1/votes
//! POST /votes
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{VoteSubmissionRequest, VoteSubmissionResponse};
use crate::domain::{CandidateId, CategoryId, CodeId, Error, VoterId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    CANDIDATE_IDS, CATEGORY_ID, CODE_ID, VOTER_ID, non_blank, parse_optional, parse_phone,
    parse_required, parse_required_list, parse_round,
};

/// Request payload for submitting ballots.
///
/// Every field is optional at the JSON layer so missing values surface as
/// field-level validation errors rather than opaque parse failures.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVotesRequest {
    #[schema(example = "code_555")]
    pub code_id: Option<String>,
    #[schema(example = "device-7f3a")]
    pub voter_id: Option<String>,
    #[schema(example = json!(["c1", "c2"]))]
    pub candidate_ids: Option<Vec<String>>,
    /// `1` (default) or `2` for the finals.
    #[schema(example = 1)]
    pub round: Option<i64>,
    pub category_id: Option<String>,
    /// Required with `sessionToken` when the code enables verification.
    #[schema(example = "+1 555 0100")]
    pub phone: Option<String>,
    pub session_token: Option<String>,
}

/// Response payload for a committed submission.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVotesResponse {
    /// `true` when at least one ballot was created.
    pub success: bool,
    pub votes_submitted: u32,
    /// Candidates this voter had already voted for in the round.
    pub duplicates: Vec<String>,
}

impl From<VoteSubmissionResponse> for SubmitVotesResponse {
    fn from(value: VoteSubmissionResponse) -> Self {
        Self {
            success: value.success,
            votes_submitted: value.votes_submitted,
            duplicates: value.duplicates.into_iter().map(String::from).collect(),
        }
    }
}

impl TryFrom<SubmitVotesRequest> for VoteSubmissionRequest {
    type Error = Error;

    fn try_from(payload: SubmitVotesRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            code_id: parse_required(payload.code_id, CODE_ID, CodeId::new)?,
            voter_id: parse_required(payload.voter_id, VOTER_ID, VoterId::new)?,
            candidate_ids: parse_required_list(
                payload.candidate_ids,
                CANDIDATE_IDS,
                CandidateId::new,
            )?,
            round: parse_round(payload.round)?,
            category_id: parse_optional(payload.category_id, CATEGORY_ID, CategoryId::new)?,
            phone: parse_phone(payload.phone)?,
            session_token: non_blank(payload.session_token),
        })
    }
}

/// Submit ballots for one voter.
#[utoipa::path(
    post,
    path = "/api/v1/votes",
    description = "Record one ballot per candidate. Repeated ballots are reported as duplicates.",
    request_body = SubmitVotesRequest,
    responses(
        (status = 200, description = "Ballots committed", body = SubmitVotesResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Phone verification failed", body = ErrorSchema),
        (status = 403, description = "Quota exhausted", body = ErrorSchema),
        (status = 404, description = "Unknown voting code", body = ErrorSchema),
        (status = 500, description = "Ballot transaction failed", body = ErrorSchema)
    ),
    tags = ["votes"],
    operation_id = "submitVotes"
)]
#[post("/votes")]
pub async fn submit_votes(
    state: web::Data<HttpState>,
    payload: web::Json<SubmitVotesRequest>,
) -> ApiResult<web::Json<SubmitVotesResponse>> {
    let request = VoteSubmissionRequest::try_from(payload.into_inner())?;
    let response = state.votes.submit(request).await?;
    Ok(web::Json(SubmitVotesResponse::from(response)))
}
