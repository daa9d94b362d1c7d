mod cloudinary;

pub use self::cloudinary::CloudinaryUploader;
