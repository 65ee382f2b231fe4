mod helpers;
mod submit_form;
