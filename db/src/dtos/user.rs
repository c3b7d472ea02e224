use common::identity::Role;

#[derive(Debug)]
pub struct UserCreateRequest {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}
