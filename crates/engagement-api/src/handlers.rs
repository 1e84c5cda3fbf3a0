use crate::dto::*;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use engagement_common::Id;
use engagement_compat::{Answer, Question};
use engagement_rsvp::{PlusOne, RsvpRequest, TargetType};
use engagement_store::RecordStore;
use engagement_voting::{Vote, VoteOption, VoteStatus};

pub async fn rsvp_submit<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Path(event_id): Path<Id>,
    Json(req): Json<RsvpSubmitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.rsvp.submit(RsvpRequest {
        target_type: TargetType::Event,
        target_id: event_id,
        user_id: req.user_id,
        role_id: req.role_id,
        note: req.note,
        plus_ones: req.plus_one_names.into_iter().map(|name| PlusOne { name }).collect(),
    })?;
    Ok((StatusCode::CREATED, Json(outcome.rsvp)))
}

pub async fn rsvp_checkin<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Path(rsvp_id): Path<Id>,
    Json(req): Json<CheckinRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.rsvp.mark_attended(&rsvp_id, req.checkin_time)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rsvp_confirm<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Path(rsvp_id): Path<Id>,
    Json(req): Json<ConfirmRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.rsvp.confirm_completion(&rsvp_id, req.confirmed_at)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rsvp_feedback<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Path(rsvp_id): Path<Id>,
    Json(req): Json<FeedbackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.rsvp.submit_feedback(&rsvp_id, req.rating, req.tags)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rsvp_cancel<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Path(rsvp_id): Path<Id>,
) -> Result<impl IntoResponse, ApiError> {
    state.rsvp.cancel(&rsvp_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn pool_join<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Path((_guild_id, pool_id)): Path<(Id, Id)>,
    Json(req): Json<PoolMembershipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.compat.join_pool(&pool_id, &req.user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn pool_leave<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Path((_guild_id, pool_id)): Path<(Id, Id)>,
    Json(req): Json<PoolMembershipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.compat.leave_pool(&pool_id, &req.user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn answer_question<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let question: Question = state
        .graph
        .store()
        .get(engagement_compat::engine::TABLE_QUESTIONS, &req.question_id)?;
    let answer = Answer {
        id: Id::new("answer", format!("{}-{}", req.question_id.local(), req.user_id.local())),
        question_id: req.question_id,
        user_id: req.user_id.clone(),
        selected_option: req.selected_option,
        acceptable_options: req.acceptable_options,
        importance: req.importance,
        is_dealbreaker: req.is_dealbreaker,
    };
    state.compat.record_answer(&question, answer)?;
    let _ = state.resonance.award_attunement_answer(&req.user_id, &question.id, &Id::new("answer", "submitted"));
    Ok(StatusCode::NO_CONTENT)
}

pub async fn compatibility<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<Id>,
    Query(query): Query<CompatibilityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let score = state.compat.pairwise_compatibility(&user_id, &query.with, &query.questions[..])?;
    Ok(Json(CompatibilityResponse { score }))
}

pub async fn resonance_score<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<Id>,
) -> Result<impl IntoResponse, ApiError> {
    let score = state.resonance.score(&user_id)?;
    Ok(Json(score))
}

pub async fn create_vote<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Json(req): Json<CreateVoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let vote_id = Id::new("vote", uuid::Uuid::new_v4().to_string());
    let vote = Vote {
        id: vote_id.clone(),
        scope: req.scope,
        scope_id: req.scope_id,
        vote_type: req.vote_type,
        prompt: req.prompt,
        options: req
            .options
            .into_iter()
            .enumerate()
            .map(|(i, label)| VoteOption { id: Id::new("option", format!("{}-{i}", vote_id.local())), label })
            .collect(),
        opens_at: req.opens_at,
        closes_at: req.closes_at,
        results_visibility: req.results_visibility,
        status: VoteStatus::Draft,
    };
    state.voting.create(vote.clone())?;
    Ok((StatusCode::CREATED, Json(vote)))
}

pub async fn cast_ballot<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Path(vote_id): Path<Id>,
    Json(req): Json<CastBallotRequest>,
) -> Result<impl IntoResponse, axum::response::Response> {
    let vote = state.voting.get(&vote_id).map_err(|e| ApiError(e).into_response())?;
    if vote.status == VoteStatus::Closed {
        return Err(crate::error::VoteClosed.into_response());
    }
    let ballot = state
        .voting
        .cast_ballot(&vote_id, &req.voter_id, &req.voter_display_name, req.selections)
        .map_err(|e| ApiError(e).into_response())?;
    Ok((StatusCode::CREATED, Json(ballot)))
}

pub async fn vote_results<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Path(vote_id): Path<Id>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.voting.tally(&vote_id)?;
    Ok(Json(result))
}

pub async fn rate_user<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Json(req): Json<RateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rating = state.trust.rate(&req.rater_id, &req.ratee_id, &req.anchor_type, &req.anchor_id, req.kind, req.note)?;
    Ok((StatusCode::CREATED, Json(rating)))
}

pub async fn endorse_rating<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Path(rating_id): Path<Id>,
    Json(req): Json<EndorseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.trust.endorse(&req.endorser_id, &rating_id, req.kind)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn flag_user<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<Id>,
    Json(req): Json<FlagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let action = state.trust.flag(&user_id, req.severity, &req.reason)?;
    Ok((StatusCode::CREATED, Json(action)))
}

pub async fn block_user<S: RecordStore + Clone>(
    State(state): State<AppState<S>>,
    Json(req): Json<BlockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.trust.block(&req.blocker_id, &req.blocked_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}
