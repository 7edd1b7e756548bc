mod member;

pub use member::{FieldMap, ID_FIELD, Member, MemberValue, NewMemberRecord, NewMemberRequest};
