pub mod photo_dto;

pub use photo_dto::{
    is_listable_extension, is_upload_extension, UploadResponseDto, LISTABLE_EXTENSIONS,
    UPLOAD_EXTENSIONS,
};
