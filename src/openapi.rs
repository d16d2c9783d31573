use crate::models::{
    CareerPath, Company, DiscussionThread, MentorshipRequest, Profile, Question, Reply, Roadmap,
    Skill, UserSummary,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::register,
        crate::routes::login,
        crate::routes::logout,
        crate::routes::auth_status,
        crate::routes::list_questions,
        crate::routes::create_question,
        crate::routes::create_reply,
        crate::routes::mentor_dashboard,
        crate::routes::create_mentorship_request,
        crate::routes::respond_mentorship_request,
        crate::routes::admin_verify_user,
    ),
    components(schemas(
        UserSummary, Profile, Skill, Company, CareerPath, Roadmap, DiscussionThread,
        Question, Reply, MentorshipRequest,
        crate::routes::RegisterRequest, crate::routes::LoginRequest,
        crate::routes::NewQuestionRequest, crate::routes::ReplyRequest,
        crate::routes::MentorshipRequestPayload, crate::routes::RespondRequest,
    )),
    tags(
        (name = "auth", description = "Registration, login and session status"),
        (name = "questions", description = "Question and reply operations"),
        (name = "mentorship", description = "Mentorship request lifecycle"),
    )
)]
pub struct ApiDoc;
