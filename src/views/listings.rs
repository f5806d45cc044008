use axum::response::Html;
use rust_decimal::Decimal;

use super::{escape, layout, Page};
use crate::database::models::{Listing, ListingDetails};

const PLACEHOLDER_IMAGE: &str = "/static/img/placeholder.svg";

fn price(price: &Decimal) -> String {
    format!("&#8377; {} / night", price.normalize())
}

fn image_url(listing: &Listing) -> String {
    listing
        .image
        .as_ref()
        .map(|image| image.url.clone())
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
}

pub fn index(page: &Page, listings: &[Listing]) -> Html<String> {
    let cards: String = listings
        .iter()
        .map(|listing| {
            format!(
                r#"<a class="listing-link" href="/listings/{id}">
  <div class="card listing-card">
    <img src="{image}" class="card-img" alt="listing image">
    <div class="card-body">
      <b>{title}</b><br>
      {price}
    </div>
  </div>
</a>"#,
                id = listing.id,
                image = escape(&image_url(listing)),
                title = escape(&listing.title),
                price = price(&listing.price),
            )
        })
        .collect();

    layout(page, "All listings", &format!(r#"<div class="listing-grid">{cards}</div>"#))
}

fn listing_fields(listing: Option<&Listing>) -> String {
    let value = |f: fn(&Listing) -> String| listing.map(f).map(|v| escape(&v)).unwrap_or_default();

    format!(
        r#"<label for="title">Title</label>
  <input id="title" name="listing[title]" type="text" value="{title}" required>
  <label for="description">Description</label>
  <textarea id="description" name="listing[description]" required>{description}</textarea>
  <label for="image">Upload listing image</label>
  <input id="image" name="listing[image]" type="file" accept=".png,.jpg,.jpeg">
  <label for="price">Price</label>
  <input id="price" name="listing[price]" type="number" min="0" step="0.01" value="{price}" required>
  <label for="country">Country</label>
  <input id="country" name="listing[country]" type="text" value="{country}" required>
  <label for="location">Location</label>
  <input id="location" name="listing[location]" type="text" value="{location}" required>"#,
        title = value(|l| l.title.clone()),
        description = value(|l| l.description.clone()),
        price = value(|l| l.price.normalize().to_string()),
        country = value(|l| l.country.clone()),
        location = value(|l| l.location.clone()),
    )
}

pub fn new_form(page: &Page) -> Html<String> {
    let body = format!(
        r#"<h1>Create a new listing</h1>
<form method="POST" action="/listings" enctype="multipart/form-data" class="form">
  {fields}
  <button type="submit">Add</button>
</form>"#,
        fields = listing_fields(None),
    );
    layout(page, "New listing", &body)
}

pub fn edit_form(page: &Page, listing: &Listing) -> Html<String> {
    let preview = listing
        .image
        .as_ref()
        .map(|image| format!(r#"<img class="preview" src="{}" alt="current image">"#, escape(&image.thumbnail_url())))
        .unwrap_or_default();

    let body = format!(
        r#"<h1>Edit your listing</h1>
<form method="POST" action="/listings/{id}?_method=PUT" enctype="multipart/form-data" class="form">
  {preview}
  {fields}
  <button type="submit">Edit</button>
</form>"#,
        id = listing.id,
        fields = listing_fields(Some(listing)),
    );
    layout(page, "Edit listing", &body)
}

pub fn show(page: &Page, details: &ListingDetails, map_token: Option<&str>) -> Html<String> {
    let listing = &details.listing;
    let viewer = page.user.as_ref().map(|u| u.id);
    let is_owner = viewer == Some(listing.owner_id);

    let owner = details
        .owner
        .as_ref()
        .map(|owner| escape(&owner.username))
        .unwrap_or_else(|| "unknown".to_string());

    let owner_actions = if is_owner {
        format!(
            r#"<div class="owner-actions">
  <a class="btn" href="/listings/{id}/edit">Edit</a>
  <form method="POST" action="/listings/{id}?_method=DELETE"><button class="btn btn-danger">Delete</button></form>
</div>"#,
            id = listing.id
        )
    } else {
        String::new()
    };

    let review_form = if page.user.is_some() {
        format!(
            r#"<h4>Leave a review</h4>
<form method="POST" action="/listings/{id}/reviews" class="form">
  <label for="rating">Rating</label>
  <input id="rating" name="review[rating]" type="range" min="1" max="5" value="3">
  <label for="comment">Comments</label>
  <textarea id="comment" name="review[comment]" required></textarea>
  <button type="submit">Submit</button>
</form>"#,
            id = listing.id
        )
    } else {
        String::new()
    };

    let reviews: String = details
        .reviews
        .iter()
        .map(|entry| {
            let author = entry
                .author
                .as_ref()
                .map(|a| escape(&a.username))
                .unwrap_or_else(|| "anonymous".to_string());
            let delete = if viewer == Some(entry.review.author_id) {
                format!(
                    r#"<form method="POST" action="/listings/{}/reviews/{}?_method=DELETE">
    <button class="btn btn-small">Delete</button>
  </form>"#,
                    listing.id, entry.review.id
                )
            } else {
                String::new()
            };
            format!(
                r#"<div class="card review">
  <h5>@{author}</h5>
  <p class="stars">{rating} / 5</p>
  <p>{comment}</p>
  {delete}
</div>"#,
                rating = entry.review.rating,
                comment = escape(&entry.review.comment),
            )
        })
        .collect();

    let map = map_token
        .map(|token| {
            format!(
                r#"<h3>Where you'll be</h3>
<div id="map" data-token="{}" data-location="{}, {}"></div>"#,
                escape(token),
                escape(&listing.location),
                escape(&listing.country)
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"<h3>{title}</h3>
<div class="card show-card">
  <img src="{image}" class="card-img show-img" alt="listing image">
  <div class="card-body">
    <p><i>Owned by {owner}</i></p>
    <p>{description}</p>
    <p>{price}</p>
    <p>{location}, {country}</p>
  </div>
</div>
{owner_actions}
<hr>
{review_form}
<h4>All reviews</h4>
<div class="reviews">{reviews}</div>
{map}"#,
        title = escape(&listing.title),
        image = escape(&image_url(listing)),
        description = escape(&listing.description),
        price = price(&listing.price),
        location = escape(&listing.location),
        country = escape(&listing.country),
    );

    layout(page, &listing.title, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn page() -> Page {
        Page { user: None, notices: Vec::new() }
    }

    #[test]
    fn price_input_accepts_cents() {
        let listing = Listing {
            id: Uuid::new_v4(),
            title: "Houseboat".to_string(),
            description: "Floats".to_string(),
            image: None,
            price: Decimal::new(12_050, 2),
            location: "Amsterdam".to_string(),
            country: "Netherlands".to_string(),
            reviews: Vec::new(),
            owner_id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
        };

        assert!(new_form(&page()).0.contains(r#"type="number" min="0" step="0.01""#));
        let edit = edit_form(&page(), &listing).0;
        assert!(edit.contains(r#"step="0.01" value="120.5""#));
    }
}
