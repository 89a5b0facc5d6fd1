use formats::{TourDataset, ViewerConfig};
use gloo_net::http::Request;
use streaming::AssetError;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlImageElement, ImageBitmap};

fn decode_error(url: &str, err: JsValue) -> AssetError {
    AssetError::Decode {
        url: url.to_string(),
        message: format!("{err:?}"),
    }
}

pub async fn fetch_text(url: &str) -> Result<String, AssetError> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| AssetError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;
    if !resp.ok() {
        return Err(AssetError::Http {
            url: url.to_string(),
            status: resp.status(),
        });
    }
    resp.text().await.map_err(|e| AssetError::Network {
        url: url.to_string(),
        message: e.to_string(),
    })
}

pub async fn fetch_dataset(url: &str) -> Result<TourDataset, String> {
    let text = fetch_text(url).await.map_err(|e| e.to_string())?;
    TourDataset::from_json_str(&text).map_err(|e| e.to_string())
}

/// Defaults when no url is given.
pub async fn fetch_config(url: Option<&str>) -> Result<ViewerConfig, String> {
    let Some(url) = url else {
        return Ok(ViewerConfig::default());
    };
    let text = fetch_text(url).await.map_err(|e| e.to_string())?;
    ViewerConfig::from_json_str(&text).map_err(|e| e.to_string())
}

/// Loads and decodes an image (photo or SVG icon) into a GPU-uploadable
/// bitmap. The browser does the fetch so SVG rasterisation works.
pub async fn load_bitmap(url: String) -> Result<ImageBitmap, AssetError> {
    let image = HtmlImageElement::new().map_err(|e| decode_error(&url, e))?;
    image.set_cross_origin(Some("anonymous"));
    image.set_src(&url);
    JsFuture::from(image.decode())
        .await
        .map_err(|e| AssetError::Network {
            url: url.clone(),
            message: format!("{e:?}"),
        })?;

    let window = web_sys::window().ok_or(AssetError::Cancelled)?;
    let promise = window
        .create_image_bitmap_with_html_image_element(&image)
        .map_err(|e| decode_error(&url, e))?;
    let bitmap = JsFuture::from(promise)
        .await
        .map_err(|e| decode_error(&url, e))?;
    bitmap
        .dyn_into::<ImageBitmap>()
        .map_err(|e| decode_error(&url, e))
}
