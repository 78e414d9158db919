//! Job membership and privilege graph, end to end over HTTP.

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use propulse_service::db::job_repo;
use propulse_service::services::jobs;
use propulse_service::AppError;
use serde_json::{json, Value};

use common::{bearer, seed_job, seed_user, session_token, setup};

#[actix_web::test]
async fn create_job_makes_creator_trusted_admin() {
    let ctx = setup().await;
    let app = init_app!(ctx.state);
    let (admin, token) = seed_user(&ctx.state, 1).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/jobs")
            .insert_header(bearer(&token))
            .set_json(json!({
                "name": "Job1",
                "city": "Austin",
                "state": "TX",
                "streetAddr": "1 Main St"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    let job_id = body["job"]["id"].as_i64().unwrap() as i32;
    assert_eq!(body["job"]["adminId"], admin.id);

    // The refreshed token already lists the new job
    let claims = ctx
        .state
        .keys
        .verify_session_token(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.jobs(), &[job_id]);

    assert!(jobs::is_member(&ctx.state.db, job_id, admin.id).await.unwrap());
    assert!(jobs::is_trusted(&ctx.state.db, job_id, admin.id).await.unwrap());
}

#[actix_web::test]
async fn create_job_rejects_invalid_body() {
    let ctx = setup().await;
    let app = init_app!(ctx.state);
    let (_, token) = seed_user(&ctx.state, 1).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/jobs")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Job1", "city": "Austin", "unknown": true }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["status"], 400);
}

#[actix_web::test]
async fn get_job_reports_privilege_per_requester() {
    let ctx = setup().await;
    let app = init_app!(ctx.state);
    let (admin, admin_token) = seed_user(&ctx.state, 1).await;
    let (_, outsider_token) = seed_user(&ctx.state, 2).await;
    let (member, _) = seed_user(&ctx.state, 3).await;
    let job_id = seed_job(&ctx.state, &admin, 1).await;
    jobs::associate(&ctx.state.db, job_id, member.id, false)
        .await
        .unwrap();
    let member_token = session_token(&ctx.state, &member).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/jobs/{job_id}"))
            .insert_header(bearer(&admin_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["job"]["privilege"], true);
    assert_eq!(body["job"]["adminEmail"], "user1@email.com");
    // The admin is left out of the member list
    let users = body["job"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "user3@email.com");

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/jobs/{job_id}"))
            .insert_header(bearer(&member_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["job"]["privilege"], false);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/jobs/{job_id}"))
            .insert_header(bearer(&outsider_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/jobs/999")
            .insert_header(bearer(&admin_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn anonymous_requests_are_unauthorized() {
    let ctx = setup().await;
    let app = init_app!(ctx.state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/jobs/1").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "Unauthorized");
    assert_eq!(body["error"]["status"], 401);
}

#[actix_web::test]
async fn user_jobs_requires_self_and_reports_no_jobs() {
    let ctx = setup().await;
    let app = init_app!(ctx.state);
    let (admin, admin_token) = seed_user(&ctx.state, 1).await;
    let (loner, loner_token) = seed_user(&ctx.state, 2).await;
    seed_job(&ctx.state, &admin, 1).await;
    seed_job(&ctx.state, &admin, 2).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/jobs/user/{}", admin.id))
            .insert_header(bearer(&admin_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["jobs"].as_array().unwrap().len(), 2);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/jobs/user/{}", loner.id))
            .insert_header(bearer(&loner_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["jobs"]["message"],
        "The user is not associated with any projects"
    );

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/jobs/user/{}", admin.id))
            .insert_header(bearer(&loner_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn associate_twice_is_a_conflict() {
    let ctx = setup().await;
    let (admin, _) = seed_user(&ctx.state, 1).await;
    let (user, _) = seed_user(&ctx.state, 2).await;
    let job_id = seed_job(&ctx.state, &admin, 1).await;

    jobs::associate(&ctx.state.db, job_id, user.id, false)
        .await
        .unwrap();
    let err = jobs::associate(&ctx.state.db, job_id, user.id, true)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // State is unchanged from the first call
    assert!(jobs::is_member(&ctx.state.db, job_id, user.id).await.unwrap());
    assert!(!jobs::is_trusted(&ctx.state.db, job_id, user.id).await.unwrap());
}

#[actix_web::test]
async fn concurrent_associate_admits_one_writer() {
    let ctx = setup().await;
    let (admin, _) = seed_user(&ctx.state, 1).await;
    let (user, _) = seed_user(&ctx.state, 2).await;
    let job_id = seed_job(&ctx.state, &admin, 1).await;

    let (first, second) = tokio::join!(
        jobs::associate(&ctx.state.db, job_id, user.id, false),
        jobs::associate(&ctx.state.db, job_id, user.id, false),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(AppError::Conflict(_)))));

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM job_associations WHERE job_id = $1 AND user_id = $2",
    )
    .bind(job_id)
    .bind(user.id)
    .fetch_one(&ctx.state.db)
    .await
    .unwrap();
    assert_eq!(rows, 1);
}

#[actix_web::test]
async fn concurrent_grant_admits_one_writer() {
    let ctx = setup().await;
    let (admin, _) = seed_user(&ctx.state, 1).await;
    let (user, _) = seed_user(&ctx.state, 2).await;
    let job_id = seed_job(&ctx.state, &admin, 1).await;
    jobs::associate(&ctx.state.db, job_id, user.id, false)
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        jobs::grant_privilege(&ctx.state.db, job_id, user.id),
        jobs::grant_privilege(&ctx.state.db, job_id, user.id),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(AppError::Conflict(_)))));
    assert!(jobs::is_trusted(&ctx.state.db, job_id, user.id).await.unwrap());
}

#[actix_web::test]
async fn duplicate_rows_are_rejected_by_storage() {
    let ctx = setup().await;
    let (admin, _) = seed_user(&ctx.state, 1).await;
    let (user, _) = seed_user(&ctx.state, 2).await;
    let job_id = seed_job(&ctx.state, &admin, 1).await;

    // Bypasses the service-level checks, as a racing writer would
    job_repo::insert_association(&ctx.state.db, job_id, user.id)
        .await
        .unwrap();
    let err = job_repo::insert_association(&ctx.state.db, job_id, user.id)
        .await
        .unwrap_err();
    assert!(matches!(AppError::from(err), AppError::Conflict(_)));

    job_repo::insert_privilege(&ctx.state.db, job_id, user.id)
        .await
        .unwrap();
    let err = job_repo::insert_privilege(&ctx.state.db, job_id, user.id)
        .await
        .unwrap_err();
    assert!(matches!(AppError::from(err), AppError::Conflict(_)));
}

#[actix_web::test]
async fn remove_user_drops_membership_and_privilege() {
    let ctx = setup().await;
    let app = init_app!(ctx.state);
    let (admin, admin_token) = seed_user(&ctx.state, 1).await;
    let (user, _) = seed_user(&ctx.state, 2).await;
    let job_id = seed_job(&ctx.state, &admin, 1).await;
    jobs::associate(&ctx.state.db, job_id, user.id, true)
        .await
        .unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/jobs/{job_id}/remove/{}", user.id))
            .insert_header(bearer(&admin_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "The user was removed from the project");

    assert!(!jobs::is_member(&ctx.state.db, job_id, user.id).await.unwrap());
    assert!(!jobs::is_trusted(&ctx.state.db, job_id, user.id).await.unwrap());

    // Removing again finds no membership
    let err = jobs::dissociate(&ctx.state.db, job_id, user.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_web::test]
async fn remove_user_requires_trust_and_keeps_admin() {
    let ctx = setup().await;
    let app = init_app!(ctx.state);
    let (admin, _) = seed_user(&ctx.state, 1).await;
    let (member, _) = seed_user(&ctx.state, 2).await;
    let (other, _) = seed_user(&ctx.state, 3).await;
    let job_id = seed_job(&ctx.state, &admin, 1).await;
    jobs::associate(&ctx.state.db, job_id, member.id, false)
        .await
        .unwrap();
    jobs::associate(&ctx.state.db, job_id, other.id, false)
        .await
        .unwrap();
    let member_token = session_token(&ctx.state, &member).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/jobs/{job_id}/remove/{}", other.id))
            .insert_header(bearer(&member_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(jobs::is_member(&ctx.state.db, job_id, other.id).await.unwrap());

    let err = jobs::dissociate(&ctx.state.db, job_id, admin.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(jobs::is_member(&ctx.state.db, job_id, admin.id).await.unwrap());
}

#[actix_web::test]
async fn trust_user_rejects_non_members_and_repeats() {
    let ctx = setup().await;
    let app = init_app!(ctx.state);
    let (admin, admin_token) = seed_user(&ctx.state, 1).await;
    let (member, _) = seed_user(&ctx.state, 2).await;
    let (outsider, _) = seed_user(&ctx.state, 3).await;
    let job_id = seed_job(&ctx.state, &admin, 1).await;
    jobs::associate(&ctx.state.db, job_id, member.id, false)
        .await
        .unwrap();

    let trust = |user_id: i32| {
        test::TestRequest::post()
            .uri(&format!("/jobs/{job_id}/trust/{user_id}"))
            .insert_header(bearer(&admin_token))
            .to_request()
    };

    let resp = test::call_service(&app, trust(outsider.id)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], jobs::NOT_MEMBER);

    let resp = test::call_service(&app, trust(member.id)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["message"],
        "You have added the user to the project as a trusted user!"
    );
    assert!(jobs::is_trusted(&ctx.state.db, job_id, member.id).await.unwrap());

    let resp = test::call_service(&app, trust(member.id)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"]["message"],
        "The user already has privileges for this project"
    );
}

#[actix_web::test]
async fn update_job_applies_partial_changes() {
    let ctx = setup().await;
    let app = init_app!(ctx.state);
    let (admin, admin_token) = seed_user(&ctx.state, 1).await;
    let job_id = seed_job(&ctx.state, &admin, 1).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/jobs/{job_id}"))
            .insert_header(bearer(&admin_token))
            .set_json(json!({ "city": "Dallas" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["job"]["city"], "Dallas");
    assert_eq!(body["job"]["name"], "Job1");
    assert_eq!(body["message"], "The project was updated successfully");

    let resp = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/jobs/{job_id}"))
            .insert_header(bearer(&admin_token))
            .set_json(json!({}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn transfer_admin_requires_member_target() {
    let ctx = setup().await;
    let app = init_app!(ctx.state);
    let (admin, admin_token) = seed_user(&ctx.state, 1).await;
    let (member, _) = seed_user(&ctx.state, 2).await;
    let (outsider, _) = seed_user(&ctx.state, 3).await;
    let job_id = seed_job(&ctx.state, &admin, 1).await;
    jobs::associate(&ctx.state.db, job_id, member.id, false)
        .await
        .unwrap();

    let transfer = |user_id: i32| {
        test::TestRequest::patch()
            .uri(&format!("/jobs/{job_id}/transfer/{user_id}"))
            .insert_header(bearer(&admin_token))
            .to_request()
    };

    let resp = test::call_service(&app, transfer(outsider.id)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(&app, transfer(member.id)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Admin transfer successful");

    let job = jobs::find_job(&ctx.state.db, job_id).await.unwrap();
    assert_eq!(job.admin_id, member.id);
    assert!(jobs::is_member(&ctx.state.db, job_id, member.id).await.unwrap());
    assert!(jobs::is_trusted(&ctx.state.db, job_id, member.id).await.unwrap());

    // The previous admin no longer passes the admin guard
    let resp = test::call_service(&app, transfer(admin.id)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
