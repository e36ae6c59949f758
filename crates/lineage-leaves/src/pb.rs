// @generated
// Generated from: proto/lineage/v1/file_history.proto
// Manual check-in for offline builds.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FileHistory {
    #[prost(string, repeated, tag = "1")]
    pub commits: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FileHistoryResultMessage {
    #[prost(map = "string, message", tag = "1")]
    pub files: ::std::collections::HashMap<::prost::alloc::string::String, FileHistory>,
}
