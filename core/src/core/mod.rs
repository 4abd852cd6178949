pub mod base_stream;
pub mod chunk_manager;
pub mod cmap;
pub mod content_stream;
pub mod crypto;
pub mod decode;
pub mod document;
pub mod encryption;
pub mod error;
pub mod file_chunked_stream;
pub mod font;
pub mod image;
pub mod lexer;
pub mod page;
pub mod parser;
pub mod retry;
pub mod stream;
pub mod sub_stream;
pub mod xref;

pub use base_stream::BaseStream;
pub use chunk_manager::{ChunkLoader, ChunkManager};
pub use cmap::CMap;
pub use content_stream::{ContentStreamEvaluator, OpCode, Operation, TextItem};
pub use crypto::{
    calculate_md5, calculate_sha256, calculate_sha384, calculate_sha512, ARC4Cipher, AES128Cipher,
    AES256Cipher, PDF17, PDF20, PDFPasswordAlgorithm,
};
pub use document::{LinearizedInfo, PDFDocument};
pub use encryption::{
    EncryptDict, EncryptionAlgorithm, EncryptionVersion, PDFPermissions,
};
pub use error::PDFError;
pub use file_chunked_stream::FileChunkedStream;
pub use font::{Font, FontDict, FontType};
pub use image::{DecodedImage, ImageColorSpace, ImageDecoder, ImageExtraction, ImageFormat, ImageMetadata};
pub use lexer::{Lexer, Token};
pub use page::{Page, PageTreeCache};
pub use parser::{PDFObject, Parser, Ref};
pub use stream::Stream;
pub use sub_stream::SubStream;
pub use xref::{XRef, XRefEntry};
