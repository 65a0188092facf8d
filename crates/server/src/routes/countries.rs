use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::country::Country;
use deployment::Deployment;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

pub async fn list_countries(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Country>>>, ApiError> {
    let countries = Country::find_all(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(countries)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/countries", get(list_countries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_deployment;

    #[tokio::test]
    async fn countries_are_listed_by_name() {
        let deployment = test_deployment().await;
        let ResponseJson(body) = list_countries(State(deployment)).await.unwrap();
        let countries = body.into_data().unwrap();
        assert_eq!(countries.len(), 8);
        assert_eq!(countries[0].name, "Australia");
    }
}
