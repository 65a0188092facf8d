use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, patch, post},
};
use db::models::{
    exercise_goal::{CreateExerciseGoal, ExerciseGoal, MeasurementType},
    goal::{GoalKind, GoalStatus},
};
use deployment::Deployment;
use serde::Deserialize;
use services::services::{
    daily_tasks::{self, GoalTaskTemplate},
    goal_sync::{self, GoalSyncError, TrackedGoal},
};
use utils::{
    dates::{parse_day, today},
    response::ApiResponse,
};
use uuid::Uuid;

use super::{ProgressRequest, parse_range, record_goal_progress, required, settle_goal_status};
use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{AppJson, AppPath, AuthUser},
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExerciseGoal {
    pub exercise_name: Option<String>,
    pub frequency: Option<String>,
    pub measurement_type: Option<MeasurementType>,
    pub rep: Option<i64>,
    #[serde(rename = "set")]
    pub sets: Option<i64>,
    pub minutes: Option<i64>,
    pub seconds: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseGoalPatch {
    pub exercise_name: Option<String>,
    pub frequency: Option<String>,
    pub measurement_type: Option<MeasurementType>,
    pub rep: Option<i64>,
    #[serde(rename = "set")]
    pub sets: Option<i64>,
    pub minutes: Option<i64>,
    pub seconds: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<GoalStatus>,
}

/// The amount fields a measurement type needs must be present and positive.
fn check_amounts(
    measurement_type: MeasurementType,
    rep: Option<i64>,
    sets: Option<i64>,
    minutes: Option<i64>,
    seconds: Option<i64>,
) -> Result<(), ApiError> {
    let positive = |value: Option<i64>| value.is_some_and(|v| v > 0);
    let ok = match measurement_type {
        MeasurementType::Repsets => positive(rep) && positive(sets),
        MeasurementType::Minutes => positive(minutes),
        MeasurementType::Seconds => positive(seconds),
    };
    if ok {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Missing amount for measurement type '{measurement_type}'"
        )))
    }
}

fn check_range(goal: &ExerciseGoal) -> Result<(), ApiError> {
    if goal.end_date < goal.start_date {
        return Err(ApiError::BadRequest(
            "endDate must not be before startDate".to_string(),
        ));
    }
    Ok(())
}

pub async fn get_goals(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<Vec<ExerciseGoal>>>, ApiError> {
    let goals = ExerciseGoal::find_by_user(&deployment.db().pool, user.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(goals)))
}

pub async fn create_goal(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppJson(payload): AppJson<NewExerciseGoal>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<ExerciseGoal>>), ApiError> {
    let (Some(exercise_name), Some(measurement_type), Some(start), Some(end)) = (
        required(&payload.exercise_name),
        payload.measurement_type,
        required(&payload.start_date),
        required(&payload.end_date),
    ) else {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    };
    let (start_date, end_date) = parse_range(start, end)?;
    check_amounts(
        measurement_type,
        payload.rep,
        payload.sets,
        payload.minutes,
        payload.seconds,
    )?;
    let data = CreateExerciseGoal {
        exercise_name: exercise_name.to_string(),
        frequency: required(&payload.frequency).map(str::to_string),
        measurement_type,
        rep: payload.rep,
        sets: payload.sets,
        minutes: payload.minutes,
        seconds: payload.seconds,
        start_date,
        end_date,
    };

    let pool = &deployment.db().pool;
    let goal = ExerciseGoal::create(pool, user.user_id, &data).await?;
    daily_tasks::seed_goal_tasks(
        pool,
        &GoalTaskTemplate::from(&goal),
        start_date,
        end_date,
        today(),
    )
    .await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(goal))))
}

pub async fn update_goal(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppPath(goal_id): AppPath<Uuid>,
    AppJson(payload): AppJson<ExerciseGoalPatch>,
) -> Result<ResponseJson<ApiResponse<TrackedGoal>>, ApiError> {
    let pool = &deployment.db().pool;
    let mut goal = ExerciseGoal::find_by_id_for_user(pool, goal_id, user.user_id)
        .await?
        .ok_or(GoalSyncError::GoalNotFound)?;
    if let Some(status) = payload.status {
        goal_sync::check_status(GoalKind::Exercise, status)?;
    }

    if let Some(name) = required(&payload.exercise_name) {
        goal.exercise_name = name.to_string();
    }
    if let Some(frequency) = required(&payload.frequency) {
        goal.frequency = frequency.to_string();
    }
    if let Some(measurement_type) = payload.measurement_type {
        goal.measurement_type = measurement_type;
    }
    goal.rep = payload.rep.or(goal.rep);
    goal.sets = payload.sets.or(goal.sets);
    goal.minutes = payload.minutes.or(goal.minutes);
    goal.seconds = payload.seconds.or(goal.seconds);
    if let Some(start) = required(&payload.start_date) {
        goal.start_date = parse_day(start)?;
    }
    if let Some(end) = required(&payload.end_date) {
        goal.end_date = parse_day(end)?;
    }
    check_range(&goal)?;
    check_amounts(
        goal.measurement_type,
        goal.rep,
        goal.sets,
        goal.minutes,
        goal.seconds,
    )?;

    let goal = TrackedGoal::Exercise(ExerciseGoal::save(pool, &goal).await?);
    let goal = settle_goal_status(pool, goal, payload.status).await?;
    Ok(ResponseJson(ApiResponse::success(goal)))
}

pub async fn delete_goal(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppPath(goal_id): AppPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    goal_sync::delete_goal(
        &deployment.db().pool,
        GoalKind::Exercise,
        goal_id,
        user.user_id,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn record_progress(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppPath(goal_id): AppPath<Uuid>,
    AppJson(payload): AppJson<ProgressRequest>,
) -> Result<ResponseJson<ApiResponse<TrackedGoal>>, ApiError> {
    let goal = record_goal_progress(
        &deployment.db().pool,
        GoalKind::Exercise,
        goal_id,
        user.user_id,
        payload,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(goal)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/goals/exercise",
        Router::new()
            .route("/", get(get_goals).post(create_goal))
            .route("/{id}", patch(update_goal).delete(delete_goal))
            .route("/{id}/progress", post(record_progress)),
    )
}

#[cfg(test)]
mod tests {
    use chrono::Days;
    use db::models::task::{Task, TaskStatus};
    use services::services::tasks::{self, TaskPatch};

    use super::*;
    use crate::test_support::{auth_user, test_deployment};

    fn squats(days: u64) -> NewExerciseGoal {
        let today = today();
        NewExerciseGoal {
            exercise_name: Some("Squats".to_string()),
            measurement_type: Some(MeasurementType::Repsets),
            rep: Some(12),
            sets: Some(3),
            start_date: Some(today.to_string()),
            end_date: Some((today + Days::new(days)).to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn seeded_tasks_describe_the_workout() {
        let deployment = test_deployment().await;
        let user = auth_user(&deployment).await;
        let (status, ResponseJson(body)) =
            create_goal(State(deployment.clone()), user, AppJson(squats(4)))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let goal = body.into_data().unwrap();
        assert_eq!(goal.frequency, "daily");

        let tasks = Task::find_by_goal(&deployment.db().pool, goal.id, GoalKind::Exercise)
            .await
            .unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(
            tasks
                .iter()
                .all(|t| t.description.as_deref() == Some("12 reps × 3 sets"))
        );
    }

    #[tokio::test]
    async fn missing_amount_is_rejected() {
        let deployment = test_deployment().await;
        let user = auth_user(&deployment).await;
        let mut payload = squats(4);
        payload.sets = None;
        let err = create_goal(State(deployment.clone()), user.clone(), AppJson(payload))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let ResponseJson(body) = get_goals(State(deployment), user).await.unwrap();
        assert!(body.into_data().unwrap().is_empty());
    }

    #[tokio::test]
    async fn skipping_every_task_marks_goal_not_done() {
        let deployment = test_deployment().await;
        let user = auth_user(&deployment).await;
        let (_, ResponseJson(body)) =
            create_goal(State(deployment.clone()), user.clone(), AppJson(squats(4)))
                .await
                .unwrap();
        let goal = body.into_data().unwrap();
        let pool = &deployment.db().pool;

        for task in Task::find_by_goal(pool, goal.id, GoalKind::Exercise).await.unwrap() {
            tasks::update_task(
                pool,
                user.user_id,
                task.id,
                &TaskPatch {
                    status: Some(TaskStatus::NotRequired.to_string()),
                    ..Default::default()
                },
                today(),
            )
            .await
            .unwrap();
        }

        let stored = ExerciseGoal::find_by_id(pool, goal.id).await.unwrap().unwrap();
        assert_eq!(stored.status, GoalStatus::NotDone);
    }

    #[tokio::test]
    async fn patch_changes_fields_and_keeps_status() {
        let deployment = test_deployment().await;
        let user = auth_user(&deployment).await;
        let (_, ResponseJson(body)) =
            create_goal(State(deployment.clone()), user.clone(), AppJson(squats(4)))
                .await
                .unwrap();
        let goal = body.into_data().unwrap();

        let ResponseJson(body) = update_goal(
            State(deployment),
            user,
            AppPath(goal.id),
            AppJson(ExerciseGoalPatch {
                measurement_type: Some(MeasurementType::Minutes),
                minutes: Some(20),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        let TrackedGoal::Exercise(updated) = body.into_data().unwrap() else {
            panic!("expected an exercise goal");
        };
        assert_eq!(updated.daily_description(), "20 min");
        assert_eq!(updated.status, GoalStatus::Active);
    }

    #[tokio::test]
    async fn refused_status_leaves_the_goal_untouched() {
        let deployment = test_deployment().await;
        let user = auth_user(&deployment).await;
        let (_, ResponseJson(body)) =
            create_goal(State(deployment.clone()), user.clone(), AppJson(squats(4)))
                .await
                .unwrap();
        let goal = body.into_data().unwrap();

        let err = update_goal(
            State(deployment.clone()),
            user,
            AppPath(goal.id),
            AppJson(ExerciseGoalPatch {
                exercise_name: Some("Lunges".to_string()),
                status: Some(GoalStatus::NotRequired),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let stored = ExerciseGoal::find_by_id(&deployment.db().pool, goal.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.exercise_name, "Squats");
    }

    #[tokio::test]
    async fn progress_is_recorded() {
        let deployment = test_deployment().await;
        let user = auth_user(&deployment).await;
        let (_, ResponseJson(body)) =
            create_goal(State(deployment.clone()), user.clone(), AppJson(squats(4)))
                .await
                .unwrap();
        let goal = body.into_data().unwrap();

        let ResponseJson(body) = record_progress(
            State(deployment),
            user,
            AppPath(goal.id),
            AppJson(ProgressRequest {
                date: Some(today().to_string()),
                completed: Some(true),
                notes: None,
            }),
        )
        .await
        .unwrap();
        let recorded = body.into_data().unwrap();
        assert_eq!(recorded.progress().len(), 1);
        assert!(recorded.progress()[0].completed);
    }
}
