/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Best-score ranking.
pub mod leaderboard_service;
/// Name and photo onboarding flow.
pub mod onboarding_service;
/// Score submission for authenticated players.
pub mod score_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
