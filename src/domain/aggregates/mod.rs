//! Aggregates module
pub mod cart;
pub mod order;
pub mod product;
pub mod review;
pub mod user;

pub use cart::{Cart, CartError, CartItem, GuestItem};
pub use order::{Checkout, Order, OrderError, OrderItem, OrderStatus, PaymentResult};
pub use product::{NewProduct, Product, ProductError, ProductPatch, RatingSummary};
pub use review::{NewReview, Review, ReviewPatch};
pub use user::{hash_token, one_time_token, EmailVerification, NewUser, Role, User, UserPatch};
